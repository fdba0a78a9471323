//! Background thumbnail rendering for upload candidates.
//!
//! Decoding images is CPU work, so renders run on the blocking pool
//! with a small concurrency cap. Finished thumbnails are batched before
//! being dispatched, so a folder of hundreds of files does not trigger
//! hundreds of store notifications.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::{Thumbnail, UploadCandidate};
use crate::store::{Action, Store};

/// Longest edge of a rendered thumbnail, in pixels.
pub const THUMBNAIL_MAX_DIM: u32 = 256;

/// Dispatch a batch once it holds this many thumbnails.
const BATCH_MAX: usize = 8;

/// Dispatch a partial batch this long after its first entry arrived.
const BATCH_WINDOW: Duration = Duration::from_millis(120);

/// Concurrent decodes on the blocking pool.
const DECODE_WORKERS: usize = 2;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode an image file and produce a JPEG thumbnail.
///
/// The aspect ratio is preserved; the longer edge becomes
/// [`THUMBNAIL_MAX_DIM`]. Images already inside the bounds are encoded
/// as-is rather than upscaled. Runs synchronously, call it from the
/// blocking pool.
pub fn render_thumbnail(path: &Path) -> Result<Thumbnail, ThumbnailError> {
    let img = image::open(path)?;
    let thumb = if img.width() <= THUMBNAIL_MAX_DIM && img.height() <= THUMBNAIL_MAX_DIM {
        img.to_rgb8()
    } else {
        img.thumbnail(THUMBNAIL_MAX_DIM, THUMBNAIL_MAX_DIM).to_rgb8()
    };
    let (width, height) = thumb.dimensions();

    let mut data = Vec::new();
    thumb.write_to(
        &mut std::io::Cursor::new(&mut data),
        image::ImageFormat::Jpeg,
    )?;

    Ok(Thumbnail {
        width,
        height,
        data,
    })
}

/// Queue that renders thumbnails for picker candidates in the
/// background and attaches them to the store in batches.
pub struct ThumbnailQueue {
    jobs: mpsc::UnboundedSender<UploadCandidate>,
    worker: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ThumbnailQueue {
    /// Start the queue's worker task.
    pub fn start(store: Store) -> Self {
        let cancel = CancellationToken::new();
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(store, jobs_rx, cancel.clone()));
        Self {
            jobs: jobs_tx,
            worker,
            cancel,
        }
    }

    /// Queue one candidate. Returns false if the queue has shut down.
    pub fn enqueue(&self, candidate: &UploadCandidate) -> bool {
        self.jobs.send(candidate.clone()).is_ok()
    }

    /// Queue every candidate in order.
    pub fn enqueue_all<'a>(&self, candidates: impl IntoIterator<Item = &'a UploadCandidate>) {
        for candidate in candidates {
            if !self.enqueue(candidate) {
                return;
            }
        }
    }

    /// Abandon pending work.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Stop accepting work and wait until everything queued so far has
    /// been rendered and dispatched.
    pub async fn finish(self) {
        let ThumbnailQueue {
            jobs,
            worker,
            cancel: _cancel,
        } = self;
        drop(jobs);
        let _ = worker.await;
    }
}

async fn run(
    store: Store,
    jobs: mpsc::UnboundedReceiver<UploadCandidate>,
    cancel: CancellationToken,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let intake = tokio::spawn(intake_loop(jobs, done_tx, cancel.clone()));

    let mut batch: Vec<(String, Thumbnail)> = Vec::new();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = done_rx.recv() => match result {
                Some((file_name, Some(thumbnail))) => {
                    if batch.is_empty() {
                        deadline = Some(Instant::now() + BATCH_WINDOW);
                    }
                    batch.push((file_name, thumbnail));
                    if batch.len() >= BATCH_MAX {
                        flush(&store, &mut batch).await;
                        deadline = None;
                    }
                }
                Some((_, None)) => {}
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                flush(&store, &mut batch).await;
                deadline = None;
            }
        }
    }

    flush(&store, &mut batch).await;
    let _ = intake.await;
}

async fn intake_loop(
    mut jobs: mpsc::UnboundedReceiver<UploadCandidate>,
    done_tx: mpsc::UnboundedSender<(String, Option<Thumbnail>)>,
    cancel: CancellationToken,
) {
    let limiter = Arc::new(Semaphore::new(DECODE_WORKERS));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            job = jobs.recv() => match job {
                Some(candidate) => {
                    let permit = match Arc::clone(&limiter).acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let done = done_tx.clone();
                    tokio::spawn(async move {
                        let file_name = candidate.file_name.clone();
                        let path = candidate.path.clone();
                        let rendered =
                            tokio::task::spawn_blocking(move || render_thumbnail(&path)).await;
                        drop(permit);
                        let thumbnail = match rendered {
                            Ok(Ok(thumbnail)) => Some(thumbnail),
                            Ok(Err(e)) => {
                                tracing::debug!(
                                    "thumbnail render failed for {}: {}",
                                    file_name,
                                    e
                                );
                                None
                            }
                            Err(e) => {
                                tracing::warn!("thumbnail task panicked: {}", e);
                                None
                            }
                        };
                        let _ = done.send((file_name, thumbnail));
                    });
                }
                None => break,
            }
        }
    }
}

async fn flush(store: &Store, batch: &mut Vec<(String, Thumbnail)>) {
    if batch.is_empty() {
        return;
    }
    let ready = std::mem::take(batch);
    tracing::debug!("attaching {} thumbnails", ready.len());
    store.dispatch(Action::ThumbnailsReady(ready)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 20, 220]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    fn candidate(path: PathBuf, file_name: &str) -> UploadCandidate {
        UploadCandidate {
            path,
            file_name: file_name.to_string(),
            size_bytes: 0,
            thumbnail: None,
        }
    }

    #[test]
    fn test_render_thumbnail_shrinks_and_keeps_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_test_png(&path, 640, 320);

        let thumbnail = render_thumbnail(&path).unwrap();
        assert_eq!(thumbnail.width, 256);
        assert_eq!(thumbnail.height, 128);
        assert!(!thumbnail.data.is_empty());
    }

    #[test]
    fn test_render_thumbnail_leaves_small_images_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_test_png(&path, 10, 10);

        let thumbnail = render_thumbnail(&path).unwrap();
        assert_eq!(thumbnail.width, 10);
        assert_eq!(thumbnail.height, 10);
    }

    #[test]
    fn test_render_thumbnail_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.jpg");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(render_thumbnail(&path).is_err());
    }

    #[tokio::test]
    async fn test_queue_attaches_thumbnails_to_picker() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        write_test_png(&good, 32, 32);
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"nope").unwrap();

        let candidates = vec![
            candidate(good, "good.png"),
            candidate(bad, "bad.png"),
        ];

        let store = Store::new();
        store
            .dispatch(Action::FolderPicked {
                folder: dir.path().to_path_buf(),
                candidates: candidates.clone(),
            })
            .await;

        let queue = ThumbnailQueue::start(store.clone());
        queue.enqueue_all(&candidates);
        queue.finish().await;

        let snapshot = store.snapshot().await;
        let good_candidate = snapshot
            .picker
            .candidates
            .iter()
            .find(|c| c.file_name == "good.png")
            .unwrap();
        assert!(good_candidate.thumbnail.is_some());

        let bad_candidate = snapshot
            .picker
            .candidates
            .iter()
            .find(|c| c.file_name == "bad.png")
            .unwrap();
        assert!(bad_candidate.thumbnail.is_none());
    }
}
