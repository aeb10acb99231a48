use std::collections::HashMap;

use anyhow::{bail, Result};

/// Environment variable holding the analysis service base URL.
pub const API_URL_VAR: &str = "CLAUSECHECK_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// The service's own model call may take up to 180s; leave headroom.
pub const DEFAULT_REQUEST_TIMEOUT_S: u64 = 300;

/// Client configuration, fixed for the lifetime of the process.
/// Values come from the environment first, then `.env`, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without a trailing slash.
    pub api_url: String,
    pub request_timeout_s: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_s: DEFAULT_REQUEST_TIMEOUT_S,
        }
    }
}

fn parse_dotenv() -> HashMap<String, String> {
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return HashMap::new();
    };
    parse_dotenv_str(&contents)
}

fn parse_dotenv_str(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim().trim_matches('"');
            map.insert(k.trim().to_string(), v.to_string());
        }
    }
    map
}

fn get(key: &str, dotenv: &HashMap<String, String>) -> Option<String> {
    std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dotenv = parse_dotenv();
        Self::resolve(get(API_URL_VAR, &dotenv))
    }

    /// Build from explicit key/value pairs, ignoring the process environment.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        Self::resolve(vars.get(API_URL_VAR).cloned())
    }

    fn resolve(api_url: Option<String>) -> Result<Self> {
        let raw = api_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(raw.starts_with("http://") || raw.starts_with("https://")) {
            bail!("{API_URL_VAR} must be an http(s) URL, got {raw:?}");
        }
        Ok(Self {
            api_url: raw.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }

    /// Full URL of the analysis endpoint.
    pub fn analyze_url(&self) -> String {
        format!("{}/api/analyze", self.api_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.api_url)
    }
}
