use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use yt_batch_uploader::config::Config;
use yt_batch_uploader::errors::{AppError, AppResult};
use yt_batch_uploader::uploader::{QueueDriver, UploadService, VideoMetadata};

/// Scripted stand-in for the YouTube client. Succeeds with "id-<title>"
/// unless told to fail a given title: either a number of transfer
/// errors first, or a permanent (non-retryable) error every time.
#[derive(Default)]
struct MockService {
    calls: Mutex<Vec<String>>,
    remaining_failures: Mutex<HashMap<String, u32>>,
    permanent_failures: Mutex<HashSet<String>>,
}

impl MockService {
    fn failing(title: &str, times: u32) -> Self {
        let service = Self::default();
        service
            .remaining_failures
            .lock()
            .unwrap()
            .insert(title.to_string(), times);
        service
    }

    fn failing_permanently(title: &str) -> Self {
        let service = Self::default();
        service
            .permanent_failures
            .lock()
            .unwrap()
            .insert(title.to_string());
        service
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadService for MockService {
    async fn upload(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> AppResult<String> {
        self.calls.lock().unwrap().push(metadata.title.clone());

        progress(0.0);
        progress(0.5);

        if self
            .permanent_failures
            .lock()
            .unwrap()
            .contains(&metadata.title)
        {
            return Err(AppError::invalid_file(
                &path.to_string_lossy(),
                "file is empty",
            ));
        }

        let mut failures = self.remaining_failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&metadata.title) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::upload_failed("simulated transfer error"));
            }
        }

        progress(1.0);
        Ok(format!("id-{}", metadata.title))
    }
}

fn test_config(root: &Path) -> Config {
    let config = Config {
        upload_dir: root.join("upload"),
        uploaded_dir: root.join("uploaded"),
        failed_dir: root.join("failed"),
        log_file: root.join("upload_log.txt"),
        // Don't actually pace the loop in tests
        min_wait_minutes: 0,
        max_wait_minutes: 0,
        ..Config::default()
    };
    fs::create_dir_all(&config.upload_dir).unwrap();
    config
}

fn source_files(config: &Config) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(&config.upload_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_empty_queue_exits_without_uploading_anything() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());

    let mut driver = QueueDriver::new(config.clone(), MockService::default());
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.quarantined, 0);
    assert!(!config.log_file.exists(), "no record without an upload");
}

#[tokio::test]
async fn test_uploads_in_sorted_order_and_relocates_files() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::write(config.upload_dir.join("clip2.mov"), b"video bytes").unwrap();
    fs::write(config.upload_dir.join("clip1.MP4"), b"video bytes").unwrap();

    let service = MockService::default();
    let mut driver = QueueDriver::new(config.clone(), service);
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.uploaded, 2);
    assert!(source_files(&config).is_empty(), "source should be drained");
    assert!(config.uploaded_dir.join("clip1.MP4").exists());
    assert!(config.uploaded_dir.join("clip2.mov").exists());

    let log = fs::read_to_string(&config.log_file).unwrap();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Uploaded: clip1 → Video ID: id-clip1"));
    assert!(lines[1].contains("Uploaded: clip2 → Video ID: id-clip2"));
}

#[tokio::test]
async fn test_failed_upload_stays_pending_and_is_retried() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::write(config.upload_dir.join("bad.webm"), b"video bytes").unwrap();

    // One transfer error, then success on the next discovery pass
    let mut driver = QueueDriver::new(config.clone(), MockService::failing("bad", 1));
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.quarantined, 0);
    assert_eq!(driver_calls(&driver), vec!["bad", "bad"]);
    assert!(config.uploaded_dir.join("bad.webm").exists());

    let log = fs::read_to_string(&config.log_file).unwrap();
    assert_eq!(log.lines().count(), 1, "only the success is recorded");
}

#[tokio::test]
async fn test_permanently_failing_file_is_quarantined_and_queue_progresses() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::write(config.upload_dir.join("bad.avi"), b"video bytes").unwrap();
    fs::write(config.upload_dir.join("good.mp4"), b"video bytes").unwrap();

    let mut driver = QueueDriver::new(config.clone(), MockService::failing("bad", u32::MAX));
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.quarantined, 1);
    // Sorted order puts bad.avi first every pass until it is quarantined
    assert_eq!(driver_calls(&driver), vec!["bad", "bad", "bad", "good"]);
    assert!(config.failed_dir.join("bad.avi").exists());
    assert!(config.uploaded_dir.join("good.mp4").exists());
    assert!(source_files(&config).is_empty());

    let log = fs::read_to_string(&config.log_file).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("good → Video ID: id-good"));
}

#[tokio::test]
async fn test_permanent_error_quarantines_without_retrying() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::write(config.upload_dir.join("empty.mp4"), b"").unwrap();
    fs::write(config.upload_dir.join("good.mp4"), b"video bytes").unwrap();

    let mut driver = QueueDriver::new(config.clone(), MockService::failing_permanently("empty"));
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.quarantined, 1);
    // No wait-and-retry cycle for an error retrying cannot fix
    assert_eq!(driver_calls(&driver), vec!["empty", "good"]);
    assert!(config.failed_dir.join("empty.mp4").exists());
    assert!(config.uploaded_dir.join("good.mp4").exists());

    let log = fs::read_to_string(&config.log_file).unwrap();
    assert_eq!(log.lines().count(), 1, "quarantined file gets no record");
}

#[tokio::test]
async fn test_non_video_files_are_never_selected() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::write(config.upload_dir.join("notes.txt"), b"not a video").unwrap();
    fs::write(config.upload_dir.join("archive.mkv"), b"not accepted").unwrap();

    let mut driver = QueueDriver::new(config.clone(), MockService::default());
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.uploaded, 0);
    assert_eq!(
        source_files(&config),
        vec!["archive.mkv".to_string(), "notes.txt".to_string()],
        "unaccepted files stay untouched"
    );
}

#[tokio::test]
async fn test_metadata_uses_config_constants_and_derived_title() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::write(config.upload_dir.join("My Clip.MOV"), b"video bytes").unwrap();

    let mut driver = QueueDriver::new(config.clone(), MockService::default());
    driver.run().await.unwrap();

    assert_eq!(driver_calls(&driver), vec!["My Clip"]);
    let metadata = VideoMetadata::for_title("My Clip".to_string(), &config);
    assert_eq!(metadata.category_id, "22");
    assert_eq!(metadata.privacy_status, "public");
    assert!(!metadata.made_for_kids);
}

fn driver_calls(driver: &QueueDriver<MockService>) -> Vec<String> {
    driver.service().calls()
}
