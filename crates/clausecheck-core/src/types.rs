use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest upload the analysis service accepts (its request body limit).
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

// ── Uploaded document ────────────────────────────────────────────────────

/// A document chosen by the user for analysis.
///
/// The bytes are reference-counted so the wizard can hand a copy to an
/// in-flight submission without duplicating the file.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    name: String,
    bytes: Bytes,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk, naming it after the path's final component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} does not name a file", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::new(name, bytes))
    }

    /// Read a document the user picked for upload.
    ///
    /// The extension and the on-disk size are checked before any bytes are
    /// loaded, so pointing at a huge file fails without reading it.
    pub async fn read_upload(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !has_pdf_extension(path) {
            bail!("only PDF files can be analyzed");
        }
        let len = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
            .len();
        if len > MAX_UPLOAD_BYTES {
            bail!(
                "{} is {}, larger than the {} upload limit",
                path.display(),
                mb_label(len),
                mb_label(MAX_UPLOAD_BYTES)
            );
        }
        Self::from_path(path).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File-picker filter: only `.pdf` names are offered for upload.
    pub fn is_pdf(&self) -> bool {
        has_pdf_extension(Path::new(&self.name))
    }

    /// MIME type sent with the multipart file part.
    pub fn mime_type(&self) -> &'static str {
        if self.is_pdf() {
            "application/pdf"
        } else {
            "application/octet-stream"
        }
    }

    /// Size in megabytes with two decimals, e.g. "0.25 MB".
    pub fn size_label(&self) -> String {
        mb_label(self.size())
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn mb_label(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

// ── Analysis payload ─────────────────────────────────────────────────────

/// Risk level reported for a flagged clause.
///
/// Anything other than High/Medium/Low is kept verbatim in `Unknown` so an
/// unexpected level never invalidates the rest of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Unknown(String),
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One excerpt the service flagged.
///
/// Deserialization goes through [`AnalysisResult::from_value`]'s clause
/// conversion, so missing or mistyped fields default instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Clause {
    pub clause_text: String,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub recommendation: String,
}

/// The `analysis` object of a successful `/api/analyze` response.
///
/// Deserializes leniently via [`AnalysisResult::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_match_warning: Option<String>,
    pub flagged_clauses: Vec<Clause>,
    pub overall_recommendation: String,
    /// Set when the service completed the request but its model call failed.
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub service_error: Option<String>,
}

impl From<Value> for AnalysisResult {
    fn from(v: Value) -> Self {
        Self::from_value(&v)
    }
}

impl From<Value> for Clause {
    fn from(v: Value) -> Self {
        clause_from_value(&v)
    }
}

impl AnalysisResult {
    /// Best-effort conversion of a loosely shaped `analysis` value.
    ///
    /// Missing or mistyped fields fall back to empty defaults. A clause that
    /// is not an object still produces an entry so nothing is silently lost.
    pub fn from_value(v: &Value) -> Self {
        let flagged_clauses = v["flagged_clauses"]
            .as_array()
            .map(|items| items.iter().map(clause_from_value).collect())
            .unwrap_or_default();

        Self {
            summary: str_field(v, "summary"),
            context_match_warning: opt_str_field(v, "context_match_warning"),
            flagged_clauses,
            overall_recommendation: str_field(v, "overall_recommendation"),
            service_error: opt_str_field(v, "error"),
        }
    }
}

fn clause_from_value(v: &Value) -> Clause {
    let risk_level = match &v["risk_level"] {
        Value::String(s) => RiskLevel::from(s.as_str()),
        Value::Null => RiskLevel::Unknown(String::new()),
        other => RiskLevel::Unknown(other.to_string()),
    };
    Clause {
        clause_text: str_field(v, "clause_text"),
        risk_level,
        explanation: str_field(v, "explanation"),
        recommendation: str_field(v, "recommendation"),
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v[key].as_str().unwrap_or("").to_string()
}

fn opt_str_field(v: &Value, key: &str) -> Option<String> {
    v[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

// ── Service health ───────────────────────────────────────────────────────

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub llm_api_status: Option<String>,
    #[serde(default)]
    pub llm_api_url: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
