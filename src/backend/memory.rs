use super::{Backend, BackendState};
use crate::acl::TopologyAclBinding;
use crate::error::Result;

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    state: Option<BackendState>,
    saves: usize,
    open: bool,
}

/// In-memory backend for testing. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that already holds a saved state with `bindings`
    pub fn with_bindings(bindings: impl IntoIterator<Item = TopologyAclBinding>) -> Self {
        let backend = Self::new();
        backend.set_state(BackendState::new(bindings));
        backend
    }

    pub fn set_state(&self, state: BackendState) {
        self.inner.lock().state = Some(state);
    }

    pub fn state(&self) -> Option<BackendState> {
        self.inner.lock().state.clone()
    }

    /// Number of `save` calls seen so far
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().open
    }
}

impl Backend for InMemoryBackend {
    fn load(&mut self) -> Result<Option<BackendState>> {
        let mut inner = self.inner.lock();
        inner.open = true;
        Ok(inner.state.clone())
    }

    fn save(&mut self, state: &BackendState) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.state = Some(state.clone());
        inner.saves += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.inner.lock().open = false;
        Ok(())
    }
}
