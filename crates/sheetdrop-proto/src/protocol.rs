use serde::{Deserialize, Serialize};

/// Upload endpoint, relative to the server base URL.
pub const PROCESS_PATH: &str = "/process-excel/";

/// Prefix of the processed-artifact endpoint; the artifact uid follows verbatim.
pub const DOWNLOAD_PATH_PREFIX: &str = "/download/";

/// Name of the single multipart field carrying the selected file.
pub const UPLOAD_FIELD: &str = "file";

/// One named count produced by the backend.
///
/// The wire names are capitalised (`Metric`, `Count`).  Counts are unsigned;
/// a negative count fails to deserialize and is treated as a malformed
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Count")]
    pub count: u64,
}

impl StatEntry {
    pub fn new(metric: impl Into<String>, count: u64) -> Self {
        Self {
            metric: metric.into(),
            count,
        }
    }
}

/// Response payload of a successful upload.
///
/// `stats` is kept in received order; that order is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub uid: String,
    pub stats: Vec<StatEntry>,
}

impl ProcessResult {
    /// Parse a response body into a `ProcessResult`.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Absolute URL of the upload endpoint for `base_url`.
pub fn process_url(base_url: &str) -> String {
    format!("{}{}", trim_base(base_url), PROCESS_PATH)
}

/// Server-relative path of the processed artifact.  `uid` is embedded as-is.
pub fn download_path(uid: &str) -> String {
    format!("{}{}", DOWNLOAD_PATH_PREFIX, uid)
}

/// Absolute URL of the processed artifact for `base_url`.
pub fn download_url(base_url: &str, uid: &str) -> String {
    format!("{}{}", trim_base(base_url), download_path(uid))
}
