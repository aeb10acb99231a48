mod render;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Result;
use clausecheck_client::HttpSubmitter;
use clausecheck_core::{
    config::Config, session::Session, types::DocumentFile, wizard::StepKind,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

const CONTEXT_PROMPT: &str = "What type of legal document is this, and what are your concerns?\n\
     (e.g. \"An employment contract; I'm worried about the non-compete and IP clauses.\")";

type Input = Lines<BufReader<Stdin>>;

fn prompt(text: &str) {
    print!("{text}\n> ");
    let _ = std::io::stdout().flush();
}

/// Next trimmed line of input, or `None` on EOF or "quit".
async fn read_line(input: &mut Input) -> Result<Option<String>> {
    let Some(line) = input.next_line().await? else {
        return Ok(None);
    };
    let line = line.trim().to_string();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Ok(None);
    }
    Ok(Some(line))
}

async fn check_health(client: &HttpSubmitter) {
    match client.health().await {
        Ok(health) if health.is_healthy() => info!(
            llm_status = health.llm_api_status.as_deref().unwrap_or("unknown"),
            model = health.llm_model.as_deref().unwrap_or("unknown"),
            "analysis service is up"
        ),
        Ok(health) => warn!(status = %health.status, "analysis service reports a problem"),
        Err(e) => warn!(url = %client.base_url(), "analysis service unreachable: {}", e),
    }
}

/// Context step. Returns false when the user quits.
async fn context_step(session: &Session, input: &mut Input) -> Result<bool> {
    let current = session.snapshot().await.context;
    if current.is_empty() {
        prompt(&format!("\nStep 1 of 3 · Context\n{CONTEXT_PROMPT}"));
    } else {
        prompt(&format!(
            "\nStep 1 of 3 · Context\nCurrent: {current}\nPress enter to keep it, or type a new description."
        ));
    }
    let Some(line) = read_line(input).await? else {
        return Ok(false);
    };
    let text = if line.is_empty() { current } else { line };
    if let Err(e) = session.submit_context(&text).await {
        println!("! {e}");
    }
    Ok(true)
}

/// File step. Returns false when the user quits.
async fn file_step(session: &Session, input: &mut Input) -> Result<bool> {
    let snap = session.snapshot().await;
    let mut text = String::from("\nStep 2 of 3 · Upload\n");
    if let Some(file) = &snap.selected_file {
        text.push_str(&format!("Selected: {} ({})\n", file.name(), file.size_label()));
        text.push_str("Press enter to analyze, give another PDF path, or type \"back\".");
    } else {
        text.push_str("Path to the PDF to analyze, or \"back\".");
    }
    prompt(&text);

    let Some(line) = read_line(input).await? else {
        return Ok(false);
    };
    if line.eq_ignore_ascii_case("back") {
        if let Err(e) = session.go_back().await {
            println!("! {e}");
        }
        return Ok(true);
    }
    if !line.is_empty() {
        let file = match DocumentFile::read_upload(&line).await {
            Ok(f) => f,
            Err(e) => {
                println!("! {e:#}");
                return Ok(true);
            },
        };
        if let Err(e) = session.select_file(file).await {
            println!("! {e}");
            return Ok(true);
        }
    }

    let Some(pending) = session.start_analysis().await else {
        println!("! select a PDF first");
        return Ok(true);
    };
    println!("Analyzing...");
    pending.await?;

    if let Some(err) = session.snapshot().await.last_error {
        println!("! {err}");
    }
    Ok(true)
}

/// Results step. Returns false when the user quits.
async fn results_step(session: &Session, input: &mut Input, color: bool) -> Result<bool> {
    if let Some(view) = session.report().await {
        println!("\nStep 3 of 3 · Results");
        print!("{}", render::report(&view, color));
    }
    prompt("\nPress enter to start a new analysis, or type \"quit\".");
    if read_line(input).await?.is_none() {
        return Ok(false);
    }
    session.reset().await;
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "clausecheck=warn,clausecheck_client=warn,clausecheck_core=warn".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    let client = HttpSubmitter::from_config(&config)?;
    info!(api_url = %config.api_url, "starting");
    let health_client = client.clone();
    tokio::spawn(async move { check_health(&health_client).await });

    let session = Session::new(Arc::new(client));
    let color = std::io::stdout().is_terminal();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("Legal document analyzer · type \"quit\" at any prompt to exit");
    loop {
        let keep_going = match session.snapshot().await.step {
            StepKind::ContextEntry => context_step(&session, &mut input).await?,
            StepKind::FileSelection => file_step(&session, &mut input).await?,
            StepKind::Results => results_step(&session, &mut input, color).await?,
        };
        if !keep_going {
            break;
        }
    }
    Ok(())
}
