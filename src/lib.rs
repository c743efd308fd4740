//! Downloader API Library
//!
//! A small HTTP service that fetches caller-named public resources on their
//! behalf without letting them reach the private network or exhaust memory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - SSRF-checked metadata probing and size-bounded streaming
//! - [`api`] - axum router, handlers, and the JSON error envelope
//! - [`scrape`] - page inspection (title, description, media links)
//! - [`notes`] - note CRUD over `SQLite`
//! - [`kv`] - key/value storage (REST-backed Redis or process memory)
//! - [`auth`] - shared-secret `x-api-key` check
//! - [`config`] - validated server configuration
//! - [`db`] - database connection and schema management

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod fetch;
pub mod kv;
pub mod notes;
pub mod scrape;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use api::{ApiError, AppState, SharedState, router};
pub use auth::ApiKeys;
pub use config::{ConfigError, ConfigSource, DEFAULT_BIND, KvBackend, ServerConfig};
pub use db::{Database, DbError};
pub use fetch::{
    AddressChecker, DEFAULT_MAX_BYTES, FetchError, GuardedClient, HostResolver, ProbeResult,
    StaticResolver, TargetUrl, TransferLimits,
};
pub use kv::{KvError, KvStore, MemoryKv, RestKv};
pub use notes::{Note, NoteError, NoteStore, NoteUpdate};
pub use scrape::{PageInspector, PageSummary, ScrapeError};
