//! Diff-and-apply engine
//!
//! The plan collects desired-state [`Action`]s, compares their union against
//! the prior snapshot and either reports (dry run) or applies the difference
//! through an [`AclsProvider`]. Deletions are gated by a [`DeletePolicy`].

pub mod action;

pub use action::Action;

use crate::acl::{ResourceType, TopologyAclBinding};
use crate::backend::BackendController;
use crate::config::DeletePolicy;
use crate::error::{Result, TopologyError};
use crate::provider::{group_by_resource, AclsProvider, BindingsByResource};

use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Building,
    Reported,
    Applied,
    Failed,
}

/// Outcome of a run. For a dry run the sets describe what would have happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub dry_run: bool,
    pub created: BTreeSet<TopologyAclBinding>,
    pub deleted: BTreeSet<TopologyAclBinding>,
    /// Stale bindings left in place because the delete policy forbids removing them
    pub skipped_deletions: BTreeSet<TopologyAclBinding>,
}

#[derive(Debug, Default)]
struct Diff {
    create: BTreeSet<TopologyAclBinding>,
    delete: BTreeSet<TopologyAclBinding>,
    keep: BTreeSet<TopologyAclBinding>,
}

pub struct ExecutionPlan<W: Write> {
    backend: BackendController,
    output: W,
    actions: Vec<Action>,
    prior: BindingsByResource,
    unmanaged: BTreeSet<TopologyAclBinding>,
    state: PlanState,
}

impl<W: Write> ExecutionPlan<W> {
    /// Load the prior snapshot from the backend and start building
    pub fn init(mut backend: BackendController, output: W) -> Result<Self> {
        backend.load()?;
        let prior = backend.bindings_by_resource();
        debug!(resources = prior.len(), "Initialized execution plan");
        Ok(Self {
            backend,
            output,
            actions: Vec::new(),
            prior,
            unmanaged: BTreeSet::new(),
            state: PlanState::Building,
        })
    }

    pub fn add(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Desired state: the union of every action's bindings
    pub fn bindings(&self) -> BTreeSet<TopologyAclBinding> {
        self.actions
            .iter()
            .flat_map(|action| action.bindings().iter().cloned())
            .collect()
    }

    pub fn prior_bindings(&self) -> &BindingsByResource {
        &self.prior
    }

    /// Replace the prior-state view, e.g. with the live cluster listing
    pub fn set_prior_state(&mut self, prior: BindingsByResource) {
        self.prior = prior;
    }

    /// Move prior bindings rejected by `managed` out of the diff.
    ///
    /// They are never created or deleted and are written back to the
    /// snapshot unchanged on apply.
    pub fn retain_managed_prior(&mut self, managed: impl Fn(&TopologyAclBinding) -> bool) {
        let mut kept = Vec::new();
        for binding in std::mem::take(&mut self.prior).into_values().flatten() {
            if managed(&binding) {
                kept.push(binding);
            } else {
                self.unmanaged.insert(binding);
            }
        }
        self.prior = group_by_resource(&kept);
    }

    /// Prior bindings outside the managed scope
    pub fn unmanaged_bindings(&self) -> &BTreeSet<TopologyAclBinding> {
        &self.unmanaged
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn backend(&self) -> &BackendController {
        &self.backend
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn run(
        &mut self,
        dry_run: bool,
        provider: &dyn AclsProvider,
        policy: DeletePolicy,
    ) -> Result<RunReport> {
        if self.state != PlanState::Building {
            return Err(TopologyError::InvalidOperation(format!(
                "execution plan already ran ({:?})",
                self.state
            )));
        }

        let result = if dry_run {
            self.report(policy)
        } else {
            self.apply(provider, policy)
        };

        match result {
            Ok(report) => {
                self.state = if dry_run {
                    PlanState::Reported
                } else {
                    PlanState::Applied
                };
                Ok(report)
            }
            Err(e) => {
                self.state = PlanState::Failed;
                if let Err(close_err) = self.backend.close() {
                    warn!(error = %close_err, "Failed to release backend after error");
                }
                Err(e)
            }
        }
    }

    fn diff(&self, policy: DeletePolicy) -> Diff {
        let desired = self.bindings();
        let desired_names: HashSet<&str> = desired.iter().map(|b| b.resource_name()).collect();

        let mut diff = Diff::default();
        let mut prior = BTreeSet::new();

        for binding in self.prior.values().flatten() {
            prior.insert(binding);
            if desired.contains(binding) {
                continue;
            }

            let topic_removed = binding.resource_type() == ResourceType::Topic
                && !desired_names.contains(binding.resource_name());
            let allowed = policy.allow_delete_bindings
                && (!topic_removed || policy.allow_delete_topics);

            if allowed {
                diff.delete.insert(binding.clone());
            } else {
                diff.keep.insert(binding.clone());
            }
        }

        diff.create = desired
            .into_iter()
            .filter(|binding| !prior.contains(binding))
            .collect();
        diff
    }

    fn report(&mut self, policy: DeletePolicy) -> Result<RunReport> {
        for action in &self.actions {
            write!(self.output, "{}", action)?;
        }

        let diff = self.diff(policy);
        if !diff.delete.is_empty() {
            writeln!(self.output, "Bindings to delete:")?;
            for binding in &diff.delete {
                writeln!(self.output, "  {}", binding)?;
            }
        }
        self.output.flush()?;

        self.backend.close()?;
        info!(
            actions = self.actions.len(),
            create = diff.create.len(),
            delete = diff.delete.len(),
            "Dry run complete"
        );

        Ok(RunReport {
            dry_run: true,
            created: diff.create,
            deleted: diff.delete,
            skipped_deletions: diff.keep,
        })
    }

    fn apply(&mut self, provider: &dyn AclsProvider, policy: DeletePolicy) -> Result<RunReport> {
        let desired = self.bindings();
        let diff = self.diff(policy);

        if !diff.create.is_empty() {
            provider.create_bindings(&diff.create)?;
            info!(count = diff.create.len(), "Created bindings");
        }

        if !diff.delete.is_empty() {
            provider.clear_bindings(&diff.delete)?;
            info!(count = diff.delete.len(), "Deleted bindings");
        }

        if !diff.keep.is_empty() {
            warn!(
                count = diff.keep.len(),
                allow_delete_bindings = policy.allow_delete_bindings,
                allow_delete_topics = policy.allow_delete_topics,
                "Stale bindings kept because of the delete policy"
            );
        }

        self.backend.clear();
        self.backend.add_bindings(&desired);
        self.backend.add_bindings(&diff.keep);
        self.backend.add_bindings(&self.unmanaged);
        self.backend.flush_and_close()?;

        Ok(RunReport {
            dry_run: false,
            created: diff.create,
            deleted: diff.delete,
            skipped_deletions: diff.keep,
        })
    }
}
