//! SSE (Server-Sent Events) support for the photo event stream.
//!
//! The backend pushes photo and catalog changes over a long-lived
//! `text/event-stream` response. This module covers the whole path from
//! raw bytes to a supervised connection:
//!
//! - `decode` - incremental UTF-8 decoding across chunk boundaries
//! - `frame` - chunk-agnostic parsing of the SSE text framing
//! - `client` - opening and validating connections, cancellation
//! - `watch` - reconnect loop with backoff and cursor resume

pub mod client;
pub mod decode;
pub mod frame;
pub mod watch;

pub use client::{ConnectOptions, EventStreamHandle, PhotoEventsClient, SseError, EVENTS_PATH};
pub use decode::Utf8Decoder;
pub use frame::{FrameParser, SseFrame};
pub use watch::{EventWatcher, WatcherConfig};
