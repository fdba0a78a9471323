//! Lightbox - a client for the Lightbox photo management backend
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod events;
pub mod models;
pub mod services;
pub mod sse;
pub mod store;
pub mod traits;
