//! Actions and the reducer that applies them.

use std::path::PathBuf;

use crate::models::{Collectible, Photo, PhotoState, Thumbnail, UploadCandidate};
use crate::store::state::{ActiveView, AppState, Banner, BannerKind, PhotoProgress};

/// Every way the application state can change.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the photo collection, e.g. after an initial list
    PhotosLoaded(Vec<Photo>),
    /// Replace the collectible collection
    CollectiblesLoaded(Vec<Collectible>),
    /// Insert or replace one photo by id
    PhotoUpserted(Photo),
    /// Remove a photo
    PhotoRemoved { photo_id: String },
    /// Set a photo's processing state
    PhotoStateChanged { photo_id: String, state: PhotoState },
    /// Record live processing progress for a photo
    ProgressReported {
        photo_id: String,
        stage: Option<String>,
        percent: Option<f32>,
    },
    /// Attach AI metadata to a photo
    MetadataMerged {
        photo_id: String,
        metadata: crate::models::AiMetadata,
    },
    /// Insert or replace one collectible by id
    CollectibleUpserted(Collectible),
    /// Remove a collectible
    CollectibleRemoved { collectible_id: String },
    /// Show a transient banner message
    BannerShown { message: String, kind: BannerKind },
    /// Dismiss the banner
    BannerCleared,
    /// Switch the main view
    ViewChanged(ActiveView),
    /// Set or clear the library state filter
    FilterChanged(Option<PhotoState>),
    /// A folder was scanned; replaces the picker contents
    FolderPicked {
        folder: PathBuf,
        candidates: Vec<UploadCandidate>,
    },
    /// Toggle one candidate's selection by its file_name key
    CandidateToggled { file_name: String },
    /// Deselect everything in the picker
    SelectionCleared,
    /// Attach rendered thumbnails to their candidates
    ThumbnailsReady(Vec<(String, Thumbnail)>),
    /// An upload batch began
    UploadStarted,
    /// An upload batch finished
    UploadFinished,
    /// One candidate uploaded successfully; drops it from the picker
    CandidateUploaded { file_name: String },
    /// Start refreshing a photo via the status poller
    PollingStarted { photo_id: String },
    /// Stop refreshing a photo
    PollingStopped { photo_id: String },
    /// The event stream saw a new last-event id
    CursorAdvanced { cursor: String },
}

/// Apply one action to the state.
///
/// Pure state transformation; it never performs IO and tolerates
/// actions referring to items that are not loaded.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::PhotosLoaded(photos) => {
            state
                .polling
                .photo_ids
                .retain(|id| photos.iter().any(|p| p.id == *id && !p.is_finished()));
            state
                .progress
                .retain(|id, _| photos.iter().any(|p| p.id == *id));
            state.photos = photos;
        }
        Action::CollectiblesLoaded(collectibles) => {
            state.collectibles = collectibles;
        }
        Action::PhotoUpserted(photo) => {
            let finished = photo.is_finished();
            let photo_id = photo.id.clone();
            match state.photos.iter_mut().find(|p| p.id == photo.id) {
                Some(existing) => *existing = photo,
                None => state.photos.push(photo),
            }
            if finished {
                state.polling.photo_ids.remove(&photo_id);
                state.progress.remove(&photo_id);
            }
        }
        Action::PhotoRemoved { photo_id } => {
            state.photos.retain(|p| p.id != photo_id);
            state.polling.photo_ids.remove(&photo_id);
            state.progress.remove(&photo_id);
        }
        Action::PhotoStateChanged { photo_id, state: new_state } => {
            if let Some(photo) = state.photos.iter_mut().find(|p| p.id == photo_id) {
                photo.state = new_state;
            }
            if new_state == PhotoState::Finished {
                state.polling.photo_ids.remove(&photo_id);
                state.progress.remove(&photo_id);
            }
        }
        Action::ProgressReported {
            photo_id,
            stage,
            percent,
        } => {
            state
                .progress
                .insert(photo_id, PhotoProgress { stage, percent });
        }
        Action::MetadataMerged { photo_id, metadata } => {
            if let Some(photo) = state.photos.iter_mut().find(|p| p.id == photo_id) {
                photo.ai = Some(metadata);
            }
        }
        Action::CollectibleUpserted(collectible) => {
            match state
                .collectibles
                .iter_mut()
                .find(|c| c.id == collectible.id)
            {
                Some(existing) => *existing = collectible,
                None => state.collectibles.push(collectible),
            }
        }
        Action::CollectibleRemoved { collectible_id } => {
            state.collectibles.retain(|c| c.id != collectible_id);
        }
        Action::BannerShown { message, kind } => {
            state.view.banner = Some(Banner { message, kind });
        }
        Action::BannerCleared => {
            state.view.banner = None;
        }
        Action::ViewChanged(view) => {
            state.view.active = view;
        }
        Action::FilterChanged(filter) => {
            state.view.filter = filter;
        }
        Action::FolderPicked { folder, candidates } => {
            state.picker.folder = Some(folder);
            state.picker.candidates = candidates;
            state.picker.selected.clear();
        }
        Action::CandidateToggled { file_name } => {
            let exists = state
                .picker
                .candidates
                .iter()
                .any(|c| c.file_name == file_name);
            if exists && !state.picker.selected.remove(&file_name) {
                state.picker.selected.insert(file_name);
            }
        }
        Action::SelectionCleared => {
            state.picker.selected.clear();
        }
        Action::ThumbnailsReady(batch) => {
            for (file_name, thumbnail) in batch {
                if let Some(candidate) = state
                    .picker
                    .candidates
                    .iter_mut()
                    .find(|c| c.file_name == file_name)
                {
                    candidate.thumbnail = Some(thumbnail);
                }
            }
        }
        Action::UploadStarted => {
            state.picker.uploading = true;
        }
        Action::UploadFinished => {
            state.picker.uploading = false;
        }
        Action::CandidateUploaded { file_name } => {
            state.picker.candidates.retain(|c| c.file_name != file_name);
            state.picker.selected.remove(&file_name);
        }
        Action::PollingStarted { photo_id } => {
            state.polling.photo_ids.insert(photo_id);
        }
        Action::PollingStopped { photo_id } => {
            state.polling.photo_ids.remove(&photo_id);
        }
        Action::CursorAdvanced { cursor } => {
            state.polling.cursor = Some(cursor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, state: PhotoState) -> Photo {
        serde_json::from_str(&format!(
            r#"{{"id": "{}", "file_name": "{}.jpg", "state": "{}"}}"#,
            id,
            id,
            state.as_str()
        ))
        .unwrap()
    }

    fn candidate(file_name: &str) -> UploadCandidate {
        UploadCandidate {
            path: PathBuf::from(format!("/photos/{}", file_name)),
            file_name: file_name.to_string(),
            size_bytes: 100,
            thumbnail: None,
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut state = AppState::default();
        reduce(&mut state, Action::PhotoUpserted(photo("p1", PhotoState::Working)));
        reduce(
            &mut state,
            Action::PhotoUpserted(photo("p1", PhotoState::InProgress)),
        );
        assert_eq!(state.photos.len(), 1);
        assert_eq!(state.photos[0].state, PhotoState::InProgress);
    }

    #[test]
    fn test_finished_photo_drops_polling_and_progress() {
        let mut state = AppState::default();
        reduce(&mut state, Action::PhotoUpserted(photo("p1", PhotoState::Working)));
        reduce(
            &mut state,
            Action::PollingStarted {
                photo_id: "p1".to_string(),
            },
        );
        reduce(
            &mut state,
            Action::ProgressReported {
                photo_id: "p1".to_string(),
                stage: Some("analyzing".to_string()),
                percent: Some(0.5),
            },
        );

        reduce(
            &mut state,
            Action::PhotoStateChanged {
                photo_id: "p1".to_string(),
                state: PhotoState::Finished,
            },
        );

        assert!(state.polling.photo_ids.is_empty());
        assert!(state.progress.is_empty());
        assert_eq!(state.photos[0].state, PhotoState::Finished);
    }

    #[test]
    fn test_photos_loaded_prunes_stale_polling() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::PollingStarted {
                photo_id: "gone".to_string(),
            },
        );
        reduce(
            &mut state,
            Action::PhotosLoaded(vec![photo("p1", PhotoState::Working)]),
        );
        assert!(state.polling.photo_ids.is_empty());
    }

    #[test]
    fn test_remove_unknown_photo_is_harmless() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::PhotoRemoved {
                photo_id: "nope".to_string(),
            },
        );
        assert!(state.photos.is_empty());
    }

    #[test]
    fn test_metadata_merge_ignores_missing_photo() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::MetadataMerged {
                photo_id: "nope".to_string(),
                metadata: Default::default(),
            },
        );
        assert!(state.photos.is_empty());
    }

    #[test]
    fn test_candidate_toggle_roundtrip() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::FolderPicked {
                folder: PathBuf::from("/photos"),
                candidates: vec![candidate("a.jpg")],
            },
        );

        reduce(
            &mut state,
            Action::CandidateToggled {
                file_name: "a.jpg".to_string(),
            },
        );
        assert!(state.picker.selected.contains("a.jpg"));

        reduce(
            &mut state,
            Action::CandidateToggled {
                file_name: "a.jpg".to_string(),
            },
        );
        assert!(state.picker.selected.is_empty());
    }

    #[test]
    fn test_toggle_unknown_candidate_does_nothing() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::CandidateToggled {
                file_name: "ghost.jpg".to_string(),
            },
        );
        assert!(state.picker.selected.is_empty());
    }

    #[test]
    fn test_candidate_uploaded_clears_selection() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::FolderPicked {
                folder: PathBuf::from("/photos"),
                candidates: vec![candidate("a.jpg"), candidate("b.jpg")],
            },
        );
        reduce(
            &mut state,
            Action::CandidateToggled {
                file_name: "a.jpg".to_string(),
            },
        );

        reduce(
            &mut state,
            Action::CandidateUploaded {
                file_name: "a.jpg".to_string(),
            },
        );

        assert_eq!(state.picker.candidates.len(), 1);
        assert!(state.picker.selected.is_empty());
    }

    #[test]
    fn test_thumbnails_attach_by_file_name() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::FolderPicked {
                folder: PathBuf::from("/photos"),
                candidates: vec![candidate("a.jpg")],
            },
        );

        let thumb = Thumbnail {
            width: 4,
            height: 4,
            data: vec![1, 2, 3],
        };
        reduce(
            &mut state,
            Action::ThumbnailsReady(vec![
                ("a.jpg".to_string(), thumb.clone()),
                ("missing.jpg".to_string(), thumb.clone()),
            ]),
        );

        assert_eq!(state.picker.candidates[0].thumbnail, Some(thumb));
    }

    #[test]
    fn test_visible_photos_respects_filter() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::PhotosLoaded(vec![
                photo("p1", PhotoState::Working),
                photo("p2", PhotoState::Finished),
            ]),
        );
        reduce(
            &mut state,
            Action::FilterChanged(Some(PhotoState::Finished)),
        );
        let visible = state.visible_photos();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "p2");
    }

    #[test]
    fn test_cursor_advances() {
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::CursorAdvanced {
                cursor: "evt_10".to_string(),
            },
        );
        assert_eq!(state.polling.cursor.as_deref(), Some("evt_10"));
    }
}
