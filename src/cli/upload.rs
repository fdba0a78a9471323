//! Upload command.

use std::path::Path;
use std::sync::Arc;

use color_eyre::Result;

use crate::api::LightboxClient;
use crate::services::{pick_folder, Uploader};
use crate::store::{Action, Store};

/// Handle the `upload` command.
///
/// Scans the folder for images, uploads all of them, and prints a
/// summary. Exits nonzero when any upload fails.
pub async fn handle_upload_command(client: Arc<LightboxClient>, folder: &Path) -> Result<()> {
    let store = Store::new();

    println!("Scanning {}...", folder.display());
    let count = pick_folder(&store, folder.to_path_buf()).await?;
    if count == 0 {
        println!("No images found.");
        return Ok(());
    }
    match count {
        1 => println!("Found 1 image"),
        n => println!("Found {} images", n),
    }

    // The CLI uploads everything the scan found
    let names: Vec<String> = store
        .select(|s| {
            s.picker
                .candidates
                .iter()
                .map(|c| c.file_name.clone())
                .collect()
        })
        .await;
    for file_name in names {
        store.dispatch(Action::CandidateToggled { file_name }).await;
    }

    let uploader = Uploader::new(client, store.clone());
    let report = uploader.upload_selected().await;

    if let Some(banner) = store.select(|s| s.view.banner.clone()).await {
        println!("{}", banner.message);
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
