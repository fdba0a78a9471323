//! Command-line argument parsing.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use std::path::PathBuf;

use crate::models::PhotoState;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Stream live photo events to stdout
    Watch { since: Option<String> },
    /// List photos in the library
    List { state: Option<PhotoState> },
    /// Show one photo's processing status
    Status { photo_id: String },
    /// Upload every image under a folder
    Upload { folder: PathBuf },
    /// Show version information
    Version,
    /// Show usage
    Help,
}

/// Parse command-line arguments and return the command to execute.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Returns
///
/// The `CliCommand` to execute, or an error message for the user.
///
/// # Examples
///
/// ```
/// use lightbox::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["lightbox".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, String>
where
    I: Iterator<Item = String>,
{
    let mut args = args.skip(1); // Skip the program name

    let first = match args.next() {
        Some(arg) => arg,
        None => return Ok(CliCommand::Help),
    };

    match first.as_str() {
        "--version" | "-V" => Ok(CliCommand::Version),
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "watch" => {
            let mut since = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--since" => {
                        since = Some(
                            args.next()
                                .ok_or_else(|| "--since requires an event id".to_string())?,
                        );
                    }
                    other => return Err(format!("unknown argument for watch: {}", other)),
                }
            }
            Ok(CliCommand::Watch { since })
        }
        "list" => {
            let mut state = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--state" => {
                        let raw = args
                            .next()
                            .ok_or_else(|| "--state requires a value".to_string())?;
                        state = Some(parse_state(&raw)?);
                    }
                    other => return Err(format!("unknown argument for list: {}", other)),
                }
            }
            Ok(CliCommand::List { state })
        }
        "status" => {
            let photo_id = args
                .next()
                .ok_or_else(|| "status requires a photo id".to_string())?;
            if let Some(extra) = args.next() {
                return Err(format!("unexpected argument: {}", extra));
            }
            Ok(CliCommand::Status { photo_id })
        }
        "upload" => {
            let folder = args
                .next()
                .ok_or_else(|| "upload requires a folder path".to_string())?;
            if let Some(extra) = args.next() {
                return Err(format!("unexpected argument: {}", extra));
            }
            Ok(CliCommand::Upload {
                folder: PathBuf::from(folder),
            })
        }
        other => Err(format!("unknown command: {}", other)),
    }
}

fn parse_state(raw: &str) -> Result<PhotoState, String> {
    match raw {
        "working" => Ok(PhotoState::Working),
        "in_progress" => Ok(PhotoState::InProgress),
        "finished" => Ok(PhotoState::Finished),
        other => Err(format!(
            "unknown state {:?} (expected working, in_progress, or finished)",
            other
        )),
    }
}
