use std::cmp::min;
use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE, RETRY_AFTER};
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::{sleep, Duration};

use crate::auth::AuthProvider;
use crate::errors::{AppError, AppResult};

use super::{UploadService, VideoMetadata};

const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// The resumable upload contract requires chunk sizes to be a multiple
/// of 256 KiB (except the final chunk).
const CHUNK_SIZE: u64 = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(120),
            exponential_base: 2.0,
        }
    }
}

/// YouTube Data API client for chunked resumable video uploads.
///
/// The transfer itself is the documented two-step dance: initiate a
/// session to obtain an upload URL, then PUT fixed-size chunks with
/// `Content-Range` headers. HTTP 308 acknowledges a chunk and reports
/// the committed offset; 200/201 is terminal and carries the video id.
pub struct YouTubeClient {
    http: Client,
    auth: AuthProvider,
    retry_config: RetryConfig,
    chunk_size: u64,
}

impl YouTubeClient {
    pub fn new(auth: AuthProvider) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            http,
            auth,
            retry_config: RetryConfig::default(),
            chunk_size: CHUNK_SIZE,
        })
    }

    async fn initiate_session(
        &self,
        metadata: &VideoMetadata,
        file_size: u64,
        mime_type: &str,
    ) -> AppResult<String> {
        let body = serde_json::json!({
            "snippet": {
                "title": metadata.title,
                "categoryId": metadata.category_id,
            },
            "status": {
                "privacyStatus": metadata.privacy_status,
                "madeForKids": metadata.made_for_kids,
                "selfDeclaredMadeForKids": metadata.made_for_kids,
            }
        });

        let mut attempt = 0;

        loop {
            let token = self.auth.access_token().await?;

            let response = self
                .http
                .post(UPLOAD_ENDPOINT)
                .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
                .bearer_auth(&token)
                .header("X-Upload-Content-Length", file_size)
                .header("X-Upload-Content-Type", mime_type)
                .json(&body)
                .send()
                .await?;

            let status = response.status();

            if status.is_success() {
                let session_url = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::upload_failed(
                            "session initiation response missing Location header",
                        )
                    })?;
                log::debug!("Resumable session opened for '{}'", metadata.title);
                return Ok(session_url);
            }

            let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error = AppError::upload_failed(format!(
                "YouTube API error {} when opening upload session: {}",
                status, error_text
            ));

            attempt += 1;
            if should_retry_status(status.as_u16()) && attempt <= self.retry_config.max_retries {
                let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
                log::warn!(
                    "Session initiation attempt {} failed, retrying in {:?}: {}",
                    attempt,
                    delay,
                    error
                );
                sleep(delay).await;
                continue;
            }

            // Out of retries on a quota response: surface the wait the
            // server asked for so the driver can report it.
            if status.as_u16() == 429 {
                let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
                return Err(AppError::RateLimit {
                    retry_after_ms: delay.as_millis() as u64,
                });
            }

            return Err(error);
        }
    }

    async fn transfer(
        &self,
        path: &Path,
        session_url: &str,
        file_size: u64,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> AppResult<String> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut offset: u64 = 0;
        let mut attempt = 0;

        progress(0.0);

        while offset < file_size {
            let end = min(offset + self.chunk_size, file_size);
            file.seek(SeekFrom::Start(offset)).await?;
            let mut buf = vec![0u8; (end - offset) as usize];
            file.read_exact(&mut buf).await?;

            let token = self.auth.access_token().await?;
            let content_range = format!("bytes {}-{}/{}", offset, end - 1, file_size);

            let response = self
                .http
                .put(session_url)
                .bearer_auth(&token)
                .header(CONTENT_LENGTH, buf.len())
                .header(CONTENT_RANGE, content_range)
                .body(buf)
                .send()
                .await?;

            let status = response.status();

            // 308: chunk accepted, more expected. The Range header tells
            // us how much the server has actually committed.
            if status.as_u16() == 308 {
                offset = response
                    .headers()
                    .get(RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(committed_offset)
                    .unwrap_or(end);
                attempt = 0;
                progress(offset as f32 / file_size as f32);
                continue;
            }

            if status.is_success() {
                let value: serde_json::Value = response.json().await?;
                let video_id = extract_video_id(&value).ok_or_else(|| {
                    AppError::upload_failed("upload completed but response carried no video id")
                })?;
                progress(1.0);
                return Ok(video_id);
            }

            let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error = AppError::upload_failed(format!(
                "YouTube API error {} at offset {}: {}",
                status, offset, error_text
            ));

            attempt += 1;
            if should_retry_status(status.as_u16()) && attempt <= self.retry_config.max_retries {
                let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
                log::warn!(
                    "Chunk at offset {} failed (attempt {}), retrying in {:?}: {}",
                    offset,
                    attempt,
                    delay,
                    error
                );
                sleep(delay).await;
                continue;
            }

            if status.as_u16() == 429 {
                let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
                return Err(AppError::RateLimit {
                    retry_after_ms: delay.as_millis() as u64,
                });
            }

            return Err(error);
        }

        Err(AppError::upload_failed(
            "upload session ended without a completion response",
        ))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.retry_config.base_delay.as_millis() as f64
            * self.retry_config.exponential_base.powi(attempt as i32 - 1);

        min(
            Duration::from_millis(delay_ms as u64),
            self.retry_config.max_delay,
        )
    }
}

#[async_trait]
impl UploadService for YouTubeClient {
    async fn upload(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> AppResult<String> {
        let file_size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::file_not_found(&path.to_string_lossy()))
            }
            Err(e) => return Err(e.into()),
        };
        if file_size == 0 {
            return Err(AppError::invalid_file(
                &path.to_string_lossy(),
                "file is empty",
            ));
        }

        let mime_type = mime_for_extension(path);
        log::info!(
            "Uploading {} ({} bytes, {}) as '{}'",
            path.display(),
            file_size,
            mime_type,
            metadata.title
        );

        let session_url = self.initiate_session(metadata, file_size, mime_type).await?;
        self.transfer(path, &session_url, file_size, progress).await
    }
}

fn should_retry_status(status_code: u16) -> bool {
    matches!(status_code, 429 | 500 | 502 | 503 | 504)
}

/// `Range: bytes=0-12345` → next offset 12346.
fn committed_offset(range_header: &str) -> Option<u64> {
    let (_, end) = range_header.rsplit_once('-')?;
    end.trim().parse::<u64>().ok().map(|last| last + 1)
}

fn parse_retry_after(header: Option<&reqwest::header::HeaderValue>) -> Option<Duration> {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

fn extract_video_id(response: &serde_json::Value) -> Option<String> {
    response
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
