//! Shared handler state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::ApiKeys;
use crate::fetch::{GuardedClient, TransferLimits};
use crate::kv::KvStore;
use crate::notes::NoteStore;
use crate::scrape::PageInspector;

/// Everything handlers need, shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: GuardedClient,
    pub limits: TransferLimits,
    pub inspector: PageInspector,
    pub kv: Arc<dyn KvStore>,
    /// `None` when no database is configured; note routes answer 503.
    pub notes: Option<NoteStore>,
    pub api_keys: ApiKeys,
    started: Instant,
}

impl AppState {
    /// The page inspector shares `client`'s connection pool and checker.
    #[must_use]
    pub fn new(
        client: GuardedClient,
        limits: TransferLimits,
        kv: Arc<dyn KvStore>,
        notes: Option<NoteStore>,
        api_keys: ApiKeys,
    ) -> Self {
        Self {
            inspector: PageInspector::new(client.clone()),
            client,
            limits,
            kv,
            notes,
            api_keys,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_inspector(mut self, inspector: PageInspector) -> Self {
        self.inspector = inspector;
        self
    }

    /// Time since the state was built.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// State handle passed to the router.
pub type SharedState = Arc<AppState>;
