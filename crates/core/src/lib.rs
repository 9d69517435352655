//! Core types and shared functionality for textweb.
//!
//! This crate provides:
//! - The `Response` value produced by the HTTP client
//! - File-backed response cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod response;

pub use cache::ResponseCache;
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use response::Response;
