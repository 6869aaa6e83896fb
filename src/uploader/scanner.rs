use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::AppResult;

/// Extensions accepted into the queue, compared case-insensitively.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "webm"];

/// List the pending videos in `dir`, sorted lexicographically by file
/// name. Directory listing order is platform-dependent; sorting keeps
/// retries and the processing order deterministic.
pub fn discover(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut candidates = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_video_candidate(&path) {
            candidates.push(path);
        }
    }

    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    log::debug!(
        "Discovered {} pending video(s) in {}",
        candidates.len(),
        dir.display()
    );
    Ok(candidates)
}

pub fn is_video_candidate(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Video title: the base file name with its extension stripped, nothing
/// else altered.
pub fn derive_title(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
