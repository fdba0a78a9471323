//! Concrete implementations of trait abstractions.
//!
//! This module provides the production adapter implementing the traits
//! defined in `crate::traits`, plus a mock for tests.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP transport using reqwest
//! - [`mock::MockHttpClient`] - Configurable responses and request recording

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockResponse, RecordedRequest};
pub use reqwest_http::ReqwestHttpClient;
