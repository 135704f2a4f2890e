// API client module: a small blocking HTTP client that talks to the
// report-upload service. Every call is synchronous; the probe runner
// drives them one after another.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Root of the service when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Blocking client bound to one service root.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Payload of `GET /`.
#[derive(Deserialize, Debug)]
pub struct HomeResponse {
    pub message: String,
}

/// Payload of `GET /api/health`.
#[derive(Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
}

/// Payload of `GET /api/stats`. The sentiment breakdown is only sent by
/// services that run the AI analyzer.
#[derive(Deserialize, Debug)]
pub struct StatsResponse {
    pub total_reports: u64,
    pub total_departments: u64,
    pub today_reports: u64,
    #[serde(default)]
    pub sentiment_distribution: Option<SentimentDistribution>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentDistribution {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

/// Form fields sent alongside the uploaded file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub department: String,
    pub date: String,
}

/// Raw payload of `POST /api/upload`. Which fields are present depends on
/// `success`; use [`UploadResponse::into_outcome`] to get a checked view.
#[derive(Deserialize, Debug)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: Option<String>,
    pub file_type: Option<String>,
    pub word_count: Option<u64>,
    pub error: Option<String>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AiAnalysis {
    pub sentiment: Option<Sentiment>,
    pub urgency: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub label: String,
}

/// What the service decided about an upload.
#[derive(Debug, PartialEq)]
pub enum UploadOutcome {
    Accepted {
        filename: String,
        file_type: String,
        word_count: u64,
        analysis: Option<AiAnalysis>,
    },
    Rejected {
        error: String,
    },
}

impl UploadResponse {
    /// Checks that an accepted upload carries everything we print. A
    /// rejection without an `error` field still counts as a rejection.
    pub fn into_outcome(self) -> Result<UploadOutcome> {
        if !self.success {
            return Ok(UploadOutcome::Rejected {
                error: self.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(UploadOutcome::Accepted {
            filename: self.filename.context("upload response missing `filename`")?,
            file_type: self.file_type.context("upload response missing `file_type`")?,
            word_count: self.word_count.context("upload response missing `word_count`")?,
            analysis: self.ai_analysis,
        })
    }
}

/// Payload of `GET /api/reports`. On a storage failure the service sends
/// `error` and an empty list without `count`; any other body lacking
/// `count` is malformed.
#[derive(Deserialize, Debug)]
pub struct ReportsResponse {
    pub count: Option<u64>,
    #[serde(default)]
    pub reports: Vec<Report>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub department: String,
    pub report_date: String,
    pub file_type: String,
    pub word_count: u64,
}

impl ApiClient {
    /// Build a client for `base_url`. Without a timeout the reqwest
    /// default applies.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let res = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to send {} request", what))?;
        read_json(res, what)
    }

    /// `GET /`
    pub fn home(&self) -> Result<HomeResponse> {
        self.get_json("/", "home")
    }

    /// `GET /api/health`
    pub fn health(&self) -> Result<HealthResponse> {
        self.get_json("/api/health", "health")
    }

    /// `GET /api/stats`. A storage failure comes back as 200 with only
    /// an `error` field; its text becomes the error message.
    pub fn stats(&self) -> Result<StatsResponse> {
        let body: Value = self.get_json("/api/stats", "stats")?;
        if let Some(error) = service_error(&body) {
            anyhow::bail!("{}", error);
        }
        serde_json::from_value(body).context("Parsing stats response json")
    }

    /// `GET /api/reports`
    pub fn reports(&self) -> Result<ReportsResponse> {
        self.get_json("/api/reports", "reports")
    }

    /// Upload a report file using multipart/form-data. The file is read
    /// up front so the request carries a known length.
    pub fn upload_report(&self, req: &UploadRequest, file_path: &Path) -> Result<UploadResponse> {
        let url = self.url("/api/upload");

        let bytes = fs::read(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let file_name = file_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("report.csv")
            .to_string();
        tracing::debug!(%url, file = %file_name, size = bytes.len(), "POST multipart");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .context("Invalid mime type for upload")?;
        let form = multipart::Form::new()
            .text("department", req.department.clone())
            .text("date", req.date.clone())
            .part("file", part);

        let res = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;
        read_json(res, "upload")
    }
}

fn read_json<T: DeserializeOwned>(res: Response, what: &str) -> Result<T> {
    let status = res.status();
    let txt = res
        .text()
        .with_context(|| format!("Failed to read {} response body", what))?;
    tracing::debug!(%status, len = txt.len(), "{} response", what);
    if !status.is_success() {
        anyhow::bail!("{} failed: {} - {}", capitalize(what), status, txt);
    }
    serde_json::from_str(&txt).with_context(|| format!("Parsing {} response json", what))
}

fn service_error(body: &Value) -> Option<&str> {
    body.get("error").and_then(Value::as_str)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
