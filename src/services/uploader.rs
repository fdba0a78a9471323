//! Upload orchestration for selected picker candidates.
//!
//! Reads each selected file, uploads it, and keeps the store in step:
//! successful uploads leave the picker, the returned photo row joins
//! the collection, and unfinished photos register with the status
//! poller. Failures leave their candidate in place and surface as a
//! banner.

use std::sync::Arc;

use crate::api::LightboxClient;
use crate::models::UploadCandidate;
use crate::store::{Action, BannerKind, Store};
use crate::traits::ApiError;

/// Outcome of one upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
}

impl UploadReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Uploads the picker's selected candidates.
pub struct Uploader {
    client: Arc<LightboxClient>,
    store: Store,
}

impl Uploader {
    pub fn new(client: Arc<LightboxClient>, store: Store) -> Self {
        Self { client, store }
    }

    /// Upload everything currently selected in the picker.
    ///
    /// Files upload concurrently (bounded by the client's request
    /// limit). Returns once every selected candidate has either
    /// uploaded or failed.
    pub async fn upload_selected(&self) -> UploadReport {
        let selected: Vec<UploadCandidate> = self
            .store
            .select(|s| {
                s.picker
                    .candidates
                    .iter()
                    .filter(|c| s.picker.selected.contains(&c.file_name))
                    .cloned()
                    .collect()
            })
            .await;

        if selected.is_empty() {
            return UploadReport::default();
        }
        let total = selected.len();

        self.store.dispatch(Action::UploadStarted).await;

        let outcomes =
            futures::future::join_all(selected.into_iter().map(|c| self.upload_one(c))).await;

        let mut report = UploadReport::default();
        let mut first_error: Option<ApiError> = None;
        for outcome in outcomes {
            match outcome {
                Ok(()) => report.uploaded += 1,
                Err(e) => {
                    report.failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        let banner = if let Some(error) = first_error {
            Action::BannerShown {
                message: format!(
                    "{} of {} uploads failed: {}",
                    report.failed,
                    total,
                    error.user_message()
                ),
                kind: BannerKind::Error,
            }
        } else {
            Action::BannerShown {
                message: match report.uploaded {
                    1 => "Uploaded 1 photo".to_string(),
                    n => format!("Uploaded {} photos", n),
                },
                kind: BannerKind::Info,
            }
        };
        self.store.dispatch(banner).await;
        self.store.dispatch(Action::UploadFinished).await;

        report
    }

    async fn upload_one(&self, candidate: UploadCandidate) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(&candidate.path)
            .await
            .map_err(|e| ApiError::Io(format!("{}: {}", candidate.file_name, e)))?;

        let photo = self.client.upload_photo(&candidate.file_name, bytes).await?;
        tracing::info!("uploaded {} as photo {}", candidate.file_name, photo.id);

        self.store
            .dispatch(Action::CandidateUploaded {
                file_name: candidate.file_name.clone(),
            })
            .await;
        let register_polling = !photo.is_finished();
        let photo_id = photo.id.clone();
        self.store.dispatch(Action::PhotoUpserted(photo)).await;
        if register_polling {
            self.store
                .dispatch(Action::PollingStarted { photo_id })
                .await;
        }
        Ok(())
    }
}
