//! Watch command.
//!
//! Connects to the live photo event stream and prints each event as a
//! line on stdout. An initial photo list seeds the store, unfinished
//! photos are polled as a safety net for missed events, and the stream
//! reconnects automatically until Ctrl+C.

use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::mpsc;

use crate::api::LightboxClient;
use crate::config::Config;
use crate::events::PhotoEvent;
use crate::services::StatusPoller;
use crate::sse::{EventWatcher, PhotoEventsClient, WatcherConfig};
use crate::store::{Action, Store};

/// Handle the `watch` command.
pub async fn handle_watch_command(config: &Config, since: Option<String>) -> Result<()> {
    if !config.events_enabled {
        eprintln!("Live events are disabled (events_enabled=false in config).");
        std::process::exit(1);
    }

    let store = Store::new();
    let api = Arc::new(LightboxClient::new(
        &config.api_base_url,
        &config.access_token,
    ));

    // Seed the store so stream events land on known photos, and poll
    // anything still processing in case an event slips past
    match api.list_photos().await {
        Ok(photos) => {
            let unfinished: Vec<String> = photos
                .iter()
                .filter(|p| !p.is_finished())
                .map(|p| p.id.clone())
                .collect();
            println!(
                "{} photo(s) in library, {} still processing",
                photos.len(),
                unfinished.len()
            );
            store.dispatch(Action::PhotosLoaded(photos)).await;
            for photo_id in unfinished {
                store.dispatch(Action::PollingStarted { photo_id }).await;
            }
        }
        Err(e) => {
            eprintln!("Warning: could not load photo list: {}", e);
        }
    }

    let poller = StatusPoller::new(api, store.clone()).with_interval(config.poll_interval());
    let poller_cancel = poller.cancellation_token();
    let poller_handle = poller.spawn();

    let events = PhotoEventsClient::new(&config.api_base_url, &config.access_token);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let watcher = EventWatcher::new(events, store.clone())
        .with_config(WatcherConfig::default().with_since(since))
        .with_forward_channel(tx);
    let cancel = watcher.cancellation_token();
    let runner = tokio::spawn(watcher.run());

    println!("Watching for photo events (Ctrl+C to stop)...");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping...");
                cancel.cancel();
                break;
            }
            event = rx.recv() => match event {
                Some(event) => print_event(&event),
                None => break,
            }
        }
    }

    poller_cancel.cancel();
    let _ = poller_handle.await;
    match runner.await {
        Ok(result) => result?,
        Err(e) => eprintln!("Warning: watcher task failed: {}", e),
    }
    Ok(())
}

fn print_event(event: &PhotoEvent) {
    let time = chrono::Local::now().format("%H:%M:%S");
    match event {
        PhotoEvent::Processing(p) => {
            let stage = p.stage.as_deref().unwrap_or("processing");
            match p.progress {
                Some(progress) => println!(
                    "{} processing  {}  {} ({:.0}%)",
                    time,
                    p.photo_id,
                    stage,
                    progress * 100.0
                ),
                None => println!("{} processing  {}  {}", time, p.photo_id, stage),
            }
        }
        PhotoEvent::StateChanged(s) => {
            println!("{} state       {}  -> {}", time, s.photo_id, s.state)
        }
        PhotoEvent::Updated(photo) => {
            println!("{} updated     {}  {}", time, photo.id, photo.file_name)
        }
        PhotoEvent::MetadataReady(m) => {
            let caption = m.metadata.caption.as_deref().unwrap_or("(no caption)");
            println!("{} metadata    {}  {}", time, m.photo_id, caption)
        }
        PhotoEvent::Removed(r) => println!("{} removed     {}", time, r.photo_id),
        PhotoEvent::CollectibleUpdated(c) => {
            println!("{} collectible {}  {}", time, c.id, c.name)
        }
        PhotoEvent::CollectibleRemoved(c) => {
            println!("{} collectible {}  removed", time, c.collectible_id)
        }
        PhotoEvent::Ping | PhotoEvent::Unknown { .. } => {}
    }
}
