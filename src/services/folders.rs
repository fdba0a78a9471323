//! Local folder scanning for the upload picker.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::UploadCandidate;
use crate::store::{Action, Store};

/// File extensions treated as uploadable images, matched case
/// insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// How deep below the picked folder the scan descends.
const MAX_SCAN_DEPTH: usize = 8;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// Walk a folder and collect image files as upload candidates.
///
/// Unreadable entries and non-image files are skipped quietly; hidden
/// files are ignored. The `file_name` of each candidate is its path
/// relative to `folder`, so files in subfolders stay distinguishable.
/// Results come back sorted by that name.
pub fn scan_folder(folder: &Path) -> Result<Vec<UploadCandidate>, ScanError> {
    if !folder.is_dir() {
        return Err(ScanError::NotADirectory(folder.to_path_buf()));
    }

    let mut candidates = Vec::new();
    for entry in WalkDir::new(folder)
        .max_depth(MAX_SCAN_DEPTH)
        .follow_links(false)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(true);
        if hidden || !has_image_extension(path) {
            continue;
        }

        let relative = path.strip_prefix(folder).unwrap_or(path);
        let file_name = relative.to_string_lossy().replace('\\', "/");
        if file_name.is_empty() {
            continue;
        }
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);

        candidates.push(UploadCandidate {
            path: path.to_path_buf(),
            file_name,
            size_bytes,
            thumbnail: None,
        });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lowered = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&lowered.as_str())
        })
        .unwrap_or(false)
}

/// Scan `folder` off the async runtime and load the result into the
/// picker. Returns the number of candidates found.
pub async fn pick_folder(store: &Store, folder: PathBuf) -> Result<usize, ScanError> {
    let scan_root = folder.clone();
    let candidates = tokio::task::spawn_blocking(move || scan_folder(&scan_root))
        .await
        .map_err(|e| ScanError::TaskFailed(e.to_string()))??;

    let count = candidates.len();
    store
        .dispatch(Action::FolderPicked { folder, candidates })
        .await;
    Ok(count)
}
