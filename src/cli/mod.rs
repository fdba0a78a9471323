//! Command-line interface.
//!
//! This module provides the CLI commands:
//! - `watch` streams live photo events
//! - `list` and `status` query the photo library
//! - `upload` pushes a folder of images to the backend
//!
//! # Usage
//!
//! Parse arguments in main(), then hand the command to [`run`] inside
//! a tokio runtime:
//!
//! ```ignore
//! use lightbox::cli::{self, parse_args};
//!
//! let command = parse_args(std::env::args())?;
//! let runtime = tokio::runtime::Runtime::new()?;
//! runtime.block_on(cli::run(command))?;
//! ```

pub mod args;
pub mod photos;
pub mod upload;
pub mod version;
pub mod watch;

pub use args::{parse_args, CliCommand};
pub use version::{handle_version_command, VERSION};

use std::sync::Arc;

use color_eyre::Result;

use crate::api::LightboxClient;
use crate::config::{self, Config};

/// Execute a parsed CLI command.
///
/// Commands that need the API load the config first and exit with an
/// error message when it is incomplete.
pub async fn run(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            print_usage();
            Ok(())
        }
        CliCommand::Watch { since } => {
            let config = load_config_or_exit();
            watch::handle_watch_command(&config, since).await
        }
        CliCommand::List { state } => {
            let config = load_config_or_exit();
            let client = LightboxClient::new(&config.api_base_url, &config.access_token);
            photos::handle_list_command(&client, state).await
        }
        CliCommand::Status { photo_id } => {
            let config = load_config_or_exit();
            let client = LightboxClient::new(&config.api_base_url, &config.access_token);
            photos::handle_status_command(&client, &photo_id).await
        }
        CliCommand::Upload { folder } => {
            let config = load_config_or_exit();
            let client = Arc::new(LightboxClient::new(
                &config.api_base_url,
                &config.access_token,
            ));
            upload::handle_upload_command(client, &folder).await
        }
    }
}

fn load_config_or_exit() -> Config {
    let config = config::load();
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    config
}

/// Print usage information.
pub fn print_usage() {
    println!("lightbox {}", VERSION);
    println!();
    println!("USAGE:");
    println!("    lightbox <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    watch              Stream live photo events");
    println!("        --since <ID>   Resume from a known event id");
    println!("    list               List photos in the library");
    println!("        --state <S>    Filter by state (working, in_progress, finished)");
    println!("    status <PHOTO_ID>  Show one photo's processing status");
    println!("    upload <FOLDER>    Upload every image under a folder");
    println!();
    println!("OPTIONS:");
    println!("    -V, --version      Print version");
    println!("    -h, --help         Print this help");
    println!();
    println!("CONFIGURATION:");
    println!("    Settings load from ~/.lightbox/config.json and can be overridden");
    println!("    with LIGHTBOX_API_URL, LIGHTBOX_TOKEN and LIGHTBOX_POLL_INTERVAL.");
}
