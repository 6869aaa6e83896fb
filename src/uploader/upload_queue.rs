use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::config::Config;
use crate::errors::AppResult;

use super::scanner;
use super::upload_log::UploadLog;
use super::{UploadService, VideoMetadata};

/// Outcome counts for a full run, reported once the queue is drained.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueueSummary {
    pub uploaded: usize,
    pub quarantined: usize,
}

/// Sequential upload-queue driver.
///
/// One file in flight at a time: discover pending videos, upload the
/// first candidate, record the outcome, then wait a random number of
/// minutes before the next pass. Upload failures leave the file in
/// place to be retried on a later pass; after `max_attempts` failures
/// the file is quarantined so one bad video cannot block the queue
/// forever. Filesystem failures (move, log append, listing) are fatal.
pub struct QueueDriver<S> {
    config: Config,
    service: S,
    upload_log: UploadLog,
    attempts: HashMap<String, u32>,
}

impl<S: UploadService + Sync> QueueDriver<S> {
    pub fn new(config: Config, service: S) -> Self {
        let upload_log = UploadLog::new(config.log_file.clone());
        Self {
            config,
            service,
            upload_log,
            attempts: HashMap::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run until no pending videos remain.
    pub async fn run(&mut self) -> AppResult<QueueSummary> {
        let mut summary = QueueSummary::default();

        loop {
            let mut candidates = scanner::discover(&self.config.upload_dir)?;
            if candidates.is_empty() {
                println!("✅ No videos left to upload.");
                break;
            }
            let video_path = candidates.remove(0);

            self.process(&video_path, &mut summary).await?;

            // Re-check before sleeping so the run doesn't pay one last
            // pointless wait after the final file.
            if scanner::discover(&self.config.upload_dir)?.is_empty() {
                println!("✅ No videos left to upload.");
                break;
            }

            let wait_minutes =
                draw_wait_minutes(self.config.min_wait_minutes, self.config.max_wait_minutes);
            println!("⏳ Waiting {} minutes until next upload...", wait_minutes);
            sleep(Duration::from_secs(wait_minutes * 60)).await;
        }

        log::info!(
            "Queue drained: {} uploaded, {} quarantined",
            summary.uploaded,
            summary.quarantined
        );
        Ok(summary)
    }

    async fn process(&mut self, video_path: &Path, summary: &mut QueueSummary) -> AppResult<()> {
        let file_name = video_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let title = scanner::derive_title(video_path);
        let metadata = VideoMetadata::for_title(title.clone(), &self.config);

        println!("\nUploading: {}", title);

        let mut last_percent = -1i32;
        let mut on_progress = |fraction: f32| {
            let percent = (fraction.clamp(0.0, 1.0) * 100.0) as i32;
            if percent != last_percent {
                last_percent = percent;
                println!("Uploading... {}%", percent);
            }
        };

        match self
            .service
            .upload(video_path, &metadata, &mut on_progress)
            .await
        {
            Ok(video_id) => {
                println!("✅ Upload complete: {}", video_id);
                self.attempts.remove(&file_name);
                self.mark_uploaded(video_path, &file_name, &title, &video_id)?;
                summary.uploaded += 1;
            }
            Err(e) => {
                // Per-file failure: report it and leave the file in place
                // for the next discovery pass.
                println!("❌ Error uploading {}: {}", file_name, e);
                log::error!("Upload failed for {}: {}", video_path.display(), e);

                if e.is_permanent() {
                    // Retrying cannot fix these; skip the wait-and-retry
                    // cycle entirely.
                    self.quarantine(video_path, &file_name)?;
                    summary.quarantined += 1;
                } else {
                    let attempts = self.attempts.entry(file_name.clone()).or_insert(0);
                    *attempts += 1;
                    if *attempts >= self.config.max_attempts {
                        self.quarantine(video_path, &file_name)?;
                        summary.quarantined += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// The rename is the uploaded-state transition. It runs before the
    /// log append, so a crash between the two can never re-upload the
    /// file; the worst case is a moved file with no record, which the
    /// LogWrite error names explicitly.
    fn mark_uploaded(
        &self,
        video_path: &Path,
        file_name: &str,
        title: &str,
        video_id: &str,
    ) -> AppResult<()> {
        fs::create_dir_all(&self.config.uploaded_dir)?;
        let destination = self.config.uploaded_dir.join(file_name);
        fs::rename(video_path, &destination)?;
        println!(
            "📦 Moved {} to '{}'",
            file_name,
            self.config.uploaded_dir.display()
        );

        self.upload_log.append(title, video_id)?;
        Ok(())
    }

    fn quarantine(&mut self, video_path: &Path, file_name: &str) -> AppResult<()> {
        fs::create_dir_all(&self.config.failed_dir)?;
        let destination = self.config.failed_dir.join(file_name);
        fs::rename(video_path, &destination)?;
        self.attempts.remove(file_name);

        println!(
            "🚫 Giving up on {}, moved to '{}'",
            file_name,
            self.config.failed_dir.display()
        );
        log::warn!("Quarantined {}", file_name);
        Ok(())
    }
}

/// Whole minutes, uniform over the inclusive range.
fn draw_wait_minutes(min_minutes: u64, max_minutes: u64) -> u64 {
    rand::rng().random_range(min_minutes..=max_minutes)
}
