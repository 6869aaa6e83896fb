// Upload queue module - drives sequential uploads of pending videos
//
// The driver owns the loop; authentication and the chunked transfer are
// collaborators behind the AuthProvider and UploadService seams.

pub mod scanner;
pub mod upload_log;
pub mod upload_queue;
pub mod youtube_client;

use std::path::Path;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::AppResult;

pub use upload_queue::{QueueDriver, QueueSummary};
pub use youtube_client::YouTubeClient;

/// Request metadata sent alongside the video bytes. Everything except
/// the title is constant for the whole run, taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub category_id: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
}

impl VideoMetadata {
    pub fn for_title(title: String, config: &Config) -> Self {
        Self {
            title,
            category_id: config.category_id.clone(),
            privacy_status: config.privacy_status.clone(),
            made_for_kids: config.made_for_kids,
        }
    }
}

/// Performs the actual transfer: chunked resumable upload yielding
/// progress fractions in [0.0, 1.0] until a terminal response with the
/// remote video id, or an upload error the driver may retry.
#[async_trait]
pub trait UploadService {
    async fn upload(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> AppResult<String>;
}
