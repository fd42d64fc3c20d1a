//! Persisted record of the last applied bindings
//!
//! A [`BackendController`] is acquired at plan init (`load`) and released at
//! the end of the run (`flush_and_close` or `close`). Between the two the
//! underlying [`Backend`] may hold an exclusive lock on durable storage.

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::InMemoryBackend;

use crate::acl::TopologyAclBinding;
use crate::error::{Result, TopologyError};
use crate::provider::{group_by_resource, BindingsByResource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Current on-disk state format
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendState {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub bindings: Vec<TopologyAclBinding>,
}

impl BackendState {
    pub fn new(bindings: impl IntoIterator<Item = TopologyAclBinding>) -> Self {
        let mut bindings: Vec<_> = bindings.into_iter().collect();
        bindings.sort();
        bindings.dedup();
        Self {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            bindings,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Durable storage for [`BackendState`]
pub trait Backend: Send {
    /// Acquire the store and read the last saved state, `None` if nothing was saved yet
    fn load(&mut self) -> Result<Option<BackendState>>;

    /// Replace the durable state
    fn save(&mut self, state: &BackendState) -> Result<()>;

    /// Release the store. Calling it more than once is a no-op.
    fn close(&mut self) -> Result<()>;
}

pub struct BackendController {
    backend: Box<dyn Backend>,
    bindings: BTreeSet<TopologyAclBinding>,
    loaded: bool,
}

impl BackendController {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            bindings: BTreeSet::new(),
            loaded: false,
        }
    }

    /// Read the prior snapshot into memory
    pub fn load(&mut self) -> Result<()> {
        let state = self.backend.load()?;
        self.bindings.clear();

        if let Some(state) = state {
            if state.version > STATE_VERSION {
                return Err(TopologyError::Backend(format!(
                    "state version {} is newer than supported version {}",
                    state.version, STATE_VERSION
                )));
            }
            self.bindings.extend(state.bindings);
        }

        self.loaded = true;
        debug!(count = self.bindings.len(), "Loaded backend state");
        Ok(())
    }

    /// Clear both the in-memory snapshot and the durable state
    pub fn reset(&mut self) -> Result<()> {
        self.bindings.clear();
        self.backend.save(&BackendState::empty())
    }

    /// Drop the in-memory snapshot, leaving durable state for the next flush
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn add_bindings<'a>(&mut self, bindings: impl IntoIterator<Item = &'a TopologyAclBinding>) {
        self.bindings.extend(bindings.into_iter().cloned());
    }

    pub fn bindings(&self) -> &BTreeSet<TopologyAclBinding> {
        &self.bindings
    }

    pub fn bindings_by_resource(&self) -> BindingsByResource {
        group_by_resource(&self.bindings)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Persist the in-memory snapshot and release the store
    pub fn flush_and_close(&mut self) -> Result<()> {
        let state = BackendState::new(self.bindings.iter().cloned());
        if let Err(e) = self.backend.save(&state) {
            self.close()?;
            return Err(e);
        }
        debug!(count = state.bindings.len(), "Flushed backend state");
        self.close()
    }

    /// Release the store without writing
    pub fn close(&mut self) -> Result<()> {
        self.loaded = false;
        self.backend.close()
    }
}

impl Drop for BackendController {
    fn drop(&mut self) {
        if self.loaded {
            if let Err(e) = self.backend.close() {
                warn!(error = %e, "Failed to close backend");
            }
        }
    }
}
