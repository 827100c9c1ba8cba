//! HTTP client for the processing service.
//!
//! `process` is the single suspension point of the workflow: one multipart
//! POST carrying the selected file, answered by a `ProcessResult`.  No timeout
//! is applied; a hung request stays pending until the transport gives up.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::protocol::{self, ProcessResult, UPLOAD_FIELD};

/// The file chosen for one workflow run.  Bytes are streamed from `path` at
/// dispatch time and nothing is kept afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self { path, name }
    }
}

/// Why an upload did not produce a `ProcessResult`.
///
/// The `Display` text carries technical detail and is meant for the log only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Network unreachable, request aborted, or the file could not be streamed.
    #[error("transport failure: {0}")]
    TransportFailure(String),
    /// Non-success response status.
    #[error("server rejected upload with status {status}")]
    ServerRejected { status: u16 },
    /// Body did not parse into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered download with status {status}")]
    Rejected { status: u16 },
    #[error("cannot write artifact: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
}

impl UploadClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let parsed = reqwest::Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("unsupported server URL scheme: {}", parsed.scheme());
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("sheetdrop/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn download_url(&self, uid: &str) -> String {
        protocol::download_url(&self.base_url, uid)
    }

    /// Upload `file` and parse the service's answer.
    pub async fn process(&self, file: &SelectedFile) -> Result<ProcessResult, TransferError> {
        let handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
            TransferError::TransportFailure(format!("cannot open {}: {}", file.path.display(), e))
        })?;
        let len = handle
            .metadata()
            .await
            .map_err(|e| TransferError::TransportFailure(e.to_string()))?
            .len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, len).file_name(file.name.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let url = protocol::process_url(&self.base_url);
        info!("uploading {} ({} bytes) to {}", file.name, len, url);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::TransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::ServerRejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransferError::TransportFailure(e.to_string()))?;
        let result = ProcessResult::from_json(&body)
            .map_err(|e| TransferError::MalformedResponse(e.to_string()))?;
        debug!("upload answered uid={} stats={}", result.uid, result.stats.len());
        Ok(result)
    }

    /// Fetch the processed artifact for `uid` into `dest_dir`.
    ///
    /// `on_progress` receives `(bytes_so_far, total)` after every chunk.  The
    /// file is written under a `.part` name and renamed once complete.
    pub async fn download(
        &self,
        uid: &str,
        dest_dir: &Path,
        mut on_progress: impl FnMut(u64, Option<u64>),
    ) -> Result<PathBuf, DownloadError> {
        let url = self.download_url(uid);
        info!("downloading artifact from {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Rejected {
                status: status.as_u16(),
            });
        }

        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format!("{}.xlsx", uid));

        tokio::fs::create_dir_all(dest_dir).await?;
        let target = unique_destination(dest_dir, &file_name);
        let mut partial = target.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        if let Err(e) = write_body(response, &partial, &mut on_progress).await {
            // Never leave a truncated artifact behind.
            if let Err(rm) = tokio::fs::remove_file(&partial).await {
                warn!("could not remove {}: {}", partial.display(), rm);
            }
            return Err(e);
        }

        tokio::fs::rename(&partial, &target).await?;
        info!("artifact saved to {}", target.display());
        Ok(target)
    }
}

/// Stream the response body into `path`, reporting `(bytes_so_far, total)`.
async fn write_body(
    response: reqwest::Response,
    path: &Path,
    on_progress: &mut impl FnMut(u64, Option<u64>),
) -> Result<(), DownloadError> {
    let total = response.content_length();
    let mut received = 0u64;
    let mut out = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        out.write_all(&chunk).await?;
        received += chunk.len() as u64;
        on_progress(received, total);
    }
    out.flush().await?;
    Ok(())
}

/// Extract a bare file name from a `Content-Disposition` header value.
/// Directory components are stripped.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let raw = value
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))?;
    let unquoted = raw.trim_matches('"');
    let name = Path::new(unquoted).file_name()?.to_string_lossy().into_owned();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// `dir/name`, or `dir/stem (n).ext` for the first `n` that does not exist yet.
fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let as_path = Path::new(name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (1u32..)
        .map(|n| dir.join(format!("{} ({}){}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_file_name() {
        let file = SelectedFile::from_path("/tmp/reports/q3 leads.xlsx");
        assert_eq!(file.name, "q3 leads.xlsx");
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(UploadClient::new("ftp://example.org").is_err());
        assert!(UploadClient::new("not a url").is_err());
        let client = UploadClient::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(
            client.download_url("abc123"),
            "http://127.0.0.1:8000/download/abc123"
        );
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="cleaned_emails.xlsx""#),
            Some("cleaned_emails.xlsx".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=../../etc/passwd"),
            Some("passwd".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn test_unique_destination_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("out (1).xlsx"), b"x").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "out.xlsx"),
            dir.path().join("out (2).xlsx")
        );
        assert_eq!(
            unique_destination(dir.path(), "fresh.xlsx"),
            dir.path().join("fresh.xlsx")
        );
    }
}
