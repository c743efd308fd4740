//! Key/value storage with optional expiry.
//!
//! Two backends implement [`KvStore`]:
//! - [`RestKv`] talks to an Upstash-compatible Redis REST endpoint
//! - [`MemoryKv`] keeps entries in process memory
//!
//! [`MemoryKv`] is per-process: several server instances do not share it.

mod error;
mod memory;
mod rest;

pub use error::KvError;
pub use memory::MemoryKv;
pub use rest::RestKv;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Storage contract behind the `/memory` routes.
#[async_trait]
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Returns the stored value, or `None` when missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError>;

    /// Stores `value`, expiring it after `ttl` when given.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), KvError>;

    /// Removes `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}
