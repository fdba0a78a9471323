//! Background services that bridge the API, the filesystem, and the
//! store.

pub mod folders;
pub mod poller;
pub mod privileges;
pub mod thumbnails;
pub mod uploader;

pub use folders::{pick_folder, scan_folder, ScanError};
pub use poller::StatusPoller;
pub use privileges::PrivilegeCache;
pub use thumbnails::{render_thumbnail, ThumbnailError, ThumbnailQueue};
pub use uploader::{UploadReport, Uploader};
