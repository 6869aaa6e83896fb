use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::errors::{AppError, AppResult};

/// Append-only record of completed uploads. One line per success, no
/// header, no rotation:
///
/// `[YYYY-MM-DD HH:MM:SS] Uploaded: <title> → Video ID: <id>`
pub struct UploadLog {
    path: PathBuf,
}

impl UploadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, title: &str, video_id: &str) -> AppResult<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] Uploaded: {} → Video ID: {}\n", timestamp, title, video_id);

        self.write_line(&line).map_err(|source| AppError::LogWrite {
            title: title.to_string(),
            video_id: video_id.to_string(),
            source,
        })
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
