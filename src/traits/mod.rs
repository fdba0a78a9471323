//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP transport operations behind the API client

pub mod http;

pub use http::{ApiError, Headers, HttpClient, Response};
