//! Cluster-side access control provider
//!
//! The execution plan is the only caller of the mutating methods. Each call
//! receives the complete set for one run.

use crate::acl::TopologyAclBinding;
use crate::error::Result;

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Bindings grouped by resource name
pub type BindingsByResource = BTreeMap<String, Vec<TopologyAclBinding>>;

pub trait AclsProvider: Send + Sync {
    /// Create every binding in the set on the cluster
    fn create_bindings(&self, bindings: &BTreeSet<TopologyAclBinding>) -> Result<()>;

    /// Remove every binding in the set from the cluster
    fn clear_bindings(&self, bindings: &BTreeSet<TopologyAclBinding>) -> Result<()>;

    /// Current cluster view, grouped by resource name
    fn list_acls(&self) -> Result<BindingsByResource>;
}

/// Group bindings by their resource name, keeping each bucket sorted
pub fn group_by_resource<'a>(
    bindings: impl IntoIterator<Item = &'a TopologyAclBinding>,
) -> BindingsByResource {
    let mut grouped: BindingsByResource = BTreeMap::new();
    for binding in bindings {
        grouped
            .entry(binding.resource_name().to_string())
            .or_default()
            .push(binding.clone());
    }
    for bucket in grouped.values_mut() {
        bucket.sort();
        bucket.dedup();
    }
    grouped
}

#[derive(Debug, Default)]
struct ProviderState {
    cluster: BTreeSet<TopologyAclBinding>,
    create_calls: Vec<BTreeSet<TopologyAclBinding>>,
    clear_calls: Vec<BTreeSet<TopologyAclBinding>>,
}

/// In-memory provider recording every call, for tests and dry environments
#[derive(Debug, Clone, Default)]
pub struct InMemoryAclsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl InMemoryAclsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose cluster already holds `bindings`
    pub fn with_cluster_bindings(bindings: impl IntoIterator<Item = TopologyAclBinding>) -> Self {
        let provider = Self::new();
        provider.state.lock().cluster.extend(bindings);
        provider
    }

    pub fn create_calls(&self) -> Vec<BTreeSet<TopologyAclBinding>> {
        self.state.lock().create_calls.clone()
    }

    pub fn clear_calls(&self) -> Vec<BTreeSet<TopologyAclBinding>> {
        self.state.lock().clear_calls.clone()
    }

    pub fn cluster_bindings(&self) -> BTreeSet<TopologyAclBinding> {
        self.state.lock().cluster.clone()
    }
}

impl AclsProvider for InMemoryAclsProvider {
    fn create_bindings(&self, bindings: &BTreeSet<TopologyAclBinding>) -> Result<()> {
        let mut state = self.state.lock();
        state.cluster.extend(bindings.iter().cloned());
        state.create_calls.push(bindings.clone());
        debug!(count = bindings.len(), "Created bindings in memory");
        Ok(())
    }

    fn clear_bindings(&self, bindings: &BTreeSet<TopologyAclBinding>) -> Result<()> {
        let mut state = self.state.lock();
        for binding in bindings {
            state.cluster.remove(binding);
        }
        state.clear_calls.push(bindings.clone());
        debug!(count = bindings.len(), "Cleared bindings in memory");
        Ok(())
    }

    fn list_acls(&self) -> Result<BindingsByResource> {
        Ok(group_by_resource(self.state.lock().cluster.iter()))
    }
}
