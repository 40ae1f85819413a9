//! warren-core library.
//!
//! Data model, SQLite store, vote aggregation, comment-forest construction,
//! thread result caching, and the AI-summary freshness policy.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` with `.context(...)` on storage paths;
//!   `thiserror` enums for the cache and summarizer ports.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Time**: microsecond UTC timestamps (`chrono::Utc::now().timestamp_micros()`).

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forest;
pub mod model;
pub mod summary;
pub mod thread;
