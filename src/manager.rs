//! Access control orchestration
//!
//! Walks a [`Topology`], turns every logical unit into a [`BindingRequest`],
//! runs it through the injected [`BindingsBuilder`], drops bindings outside
//! the managed scope and registers one [`Action`] per unit on the plan.

use crate::acl::{
    BindingRequest, BindingScope, BindingsBuilder, ResourceType, TopologyAclBinding,
};
use crate::config::{Config, ScopeConfig};
use crate::error::Result;
use crate::model::users::ANY_GROUP;
use crate::model::{Project, Topology};
use crate::naming::NameResolver;
use crate::plan::{Action, ExecutionPlan};
use crate::provider::{group_by_resource, AclsProvider, BindingsByResource};

use std::io::Write;
use tracing::{debug, info};

/// Managed-prefix filters applied before a binding may enter the plan
#[derive(Debug, Clone, Copy)]
pub struct ManagedScope<'c> {
    config: &'c ScopeConfig,
}

fn matches_any(prefixes: &[String], name: &str) -> bool {
    prefixes.is_empty() || prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

impl<'c> ManagedScope<'c> {
    pub fn new(config: &'c ScopeConfig) -> Self {
        Self { config }
    }

    pub fn admits(&self, binding: &TopologyAclBinding) -> bool {
        if !matches_any(&self.config.service_account_managed_prefixes, binding.principal()) {
            return false;
        }

        let name = binding.resource_name();
        match binding.resource_type() {
            ResourceType::Topic => matches_any(&self.config.topic_managed_prefixes, name),
            ResourceType::Group => {
                name == ANY_GROUP || matches_any(&self.config.group_managed_prefixes, name)
            }
            ResourceType::Cluster | ResourceType::TransactionalId => true,
        }
    }

    /// Internal topic bindings are never treated as user managed
    pub fn is_internal(&self, binding: &TopologyAclBinding) -> bool {
        binding.resource_type() == ResourceType::Topic
            && self.config.is_internal_topic(binding.resource_name())
    }

    /// A prior binding this run may create or delete
    pub fn manages(&self, binding: &TopologyAclBinding) -> bool {
        !self.is_internal(binding) && self.admits(binding)
    }

    pub fn manages_topic(&self, topic: &str) -> bool {
        matches_any(&self.config.topic_managed_prefixes, topic)
    }
}

pub struct AccessControlManager<'a> {
    provider: &'a dyn AclsProvider,
    builder: &'a dyn BindingsBuilder,
    config: &'a Config,
}

impl<'a> AccessControlManager<'a> {
    pub fn new(
        provider: &'a dyn AclsProvider,
        builder: &'a dyn BindingsBuilder,
        config: &'a Config,
    ) -> Self {
        Self {
            provider,
            builder,
            config,
        }
    }

    /// Register the topology's actions on `plan`.
    ///
    /// Generation for the whole topology finishes before the plan is touched,
    /// so a failure leaves the plan as it was.
    pub fn update_plan<W: Write>(&self, topology: &Topology, plan: &mut ExecutionPlan<W>) -> Result<()> {
        let actions = self.actions(topology)?;

        let cluster_prior = if self.config.state.from_cluster {
            Some(self.cluster_state()?)
        } else {
            None
        };

        let scope = ManagedScope::new(&self.config.scope);
        plan.retain_managed_prior(|binding| scope.manages(binding));
        if !plan.unmanaged_bindings().is_empty() {
            debug!(
                count = plan.unmanaged_bindings().len(),
                "Prior bindings outside the managed scope left untouched"
            );
        }

        if let Some(prior) = cluster_prior {
            debug!(resources = prior.len(), "Using cluster bindings as prior state");
            plan.set_prior_state(prior);
        }

        let count: usize = actions.iter().map(|action| action.bindings().len()).sum();
        for action in actions {
            plan.add(action);
        }

        info!(
            context = %topology.context,
            actions = plan.actions().len(),
            bindings = count,
            "Updated execution plan"
        );
        Ok(())
    }

    /// Every non-empty action for the topology, in generation order
    pub fn actions(&self, topology: &Topology) -> Result<Vec<Action>> {
        let scope = ManagedScope::new(&self.config.scope);
        let requests = self.requests(topology)?;

        let mut actions = Vec::with_capacity(requests.len());
        for request in &requests {
            if let Some(topic) = request.literal_topic() {
                if !scope.manages_topic(topic) {
                    debug!(action = %request.describe(), "Skipping unmanaged topic");
                    continue;
                }
            }

            let generated = self.builder.build(request)?;
            let total = generated.len();
            let admitted: Vec<_> = generated.into_iter().filter(|b| scope.admits(b)).collect();

            let description = request.describe();
            debug!(
                action = %description,
                generated = total,
                admitted = admitted.len(),
                "Generated bindings"
            );

            if !admitted.is_empty() {
                actions.push(Action::new(description, admitted));
            }
        }
        Ok(actions)
    }

    fn requests<'t>(&self, topology: &'t Topology) -> Result<Vec<BindingRequest<'t>>> {
        let resolver = NameResolver::new(&self.config.naming);
        let mut requests = Vec::new();

        for project in &topology.projects {
            self.project_requests(&resolver, topology, project, &mut requests)?;
        }

        for topic in &topology.special_topics {
            if !topic.consumers.is_empty() {
                requests.push(BindingRequest::Consumers {
                    consumers: topic.consumers.clone(),
                    scope: BindingScope::Literal(topic.name.clone()),
                });
            }
            if !topic.producers.is_empty() {
                requests.push(BindingRequest::Producers {
                    producers: topic.producers.clone(),
                    scope: BindingScope::Literal(topic.name.clone()),
                });
            }
        }

        if let Some(platform) = &topology.platform {
            for instance in platform.schema_registry_instances() {
                requests.push(BindingRequest::SchemaRegistry { instance });
            }
            for instance in platform.control_center_instances() {
                requests.push(BindingRequest::ControlCenter { instance });
            }
            for assignment in platform.rbac_assignments() {
                requests.push(BindingRequest::ClusterRole {
                    role: assignment.role,
                    principal: assignment.principal,
                    component: assignment.component,
                });
            }
        }

        Ok(requests)
    }

    fn project_requests<'t>(
        &self,
        resolver: &NameResolver<'_>,
        topology: &'t Topology,
        project: &'t Project,
        requests: &mut Vec<BindingRequest<'t>>,
    ) -> Result<()> {
        let prefix = resolver.project_prefix(topology, project)?;
        let optimized = self.config.is_optimized_acls();

        if optimized {
            if !project.consumers.is_empty() {
                requests.push(BindingRequest::Consumers {
                    consumers: project.consumers.clone(),
                    scope: BindingScope::Prefixed(prefix.clone()),
                });
            }
            if !project.producers.is_empty() {
                requests.push(BindingRequest::Producers {
                    producers: project.producers.clone(),
                    scope: BindingScope::Prefixed(prefix.clone()),
                });
            }
        }

        for topic in &project.topics {
            let name = resolver.topic_name(topology, project, topic)?;

            let (consumers, producers) = if optimized {
                // Project-level entries are already covered by the prefix
                let consumers: Vec<_> = topic
                    .consumers
                    .iter()
                    .filter(|c| !project.consumers.contains(c))
                    .cloned()
                    .collect();
                let producers: Vec<_> = topic
                    .producers
                    .iter()
                    .filter(|p| !project.producers.contains(p))
                    .cloned()
                    .collect();
                (consumers, producers)
            } else {
                (project.consumers_for(topic), project.producers_for(topic))
            };

            if !consumers.is_empty() {
                requests.push(BindingRequest::Consumers {
                    consumers,
                    scope: BindingScope::Literal(name.clone()),
                });
            }
            if !producers.is_empty() {
                requests.push(BindingRequest::Producers {
                    producers,
                    scope: BindingScope::Literal(name),
                });
            }
        }

        for app in &project.streams {
            requests.push(BindingRequest::Stream {
                app,
                prefix: prefix.clone(),
            });
        }

        for connector in &project.connectors {
            requests.push(BindingRequest::Connector { connector });
        }

        for app in &project.ksql_apps {
            requests.push(BindingRequest::KSqlApp { app });
        }

        for assignment in &project.others {
            for topic in &assignment.topics {
                requests.push(BindingRequest::CustomRole {
                    role: &assignment.role,
                    principal: &assignment.principal,
                    topic,
                });
            }
        }

        Ok(())
    }

    /// Live cluster bindings restricted to what this tool manages
    fn cluster_state(&self) -> Result<BindingsByResource> {
        let scope = ManagedScope::new(&self.config.scope);
        let listed = self.provider.list_acls()?;

        let managed: Vec<&TopologyAclBinding> = listed
            .values()
            .flatten()
            .filter(|binding| scope.manages(binding))
            .collect();

        Ok(group_by_resource(managed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{AclOperation, PatternType, ResourcePattern};

    fn binding(principal: &str, resource: ResourcePattern) -> TopologyAclBinding {
        TopologyAclBinding::allow(principal, resource, AclOperation::Read)
    }

    #[test]
    fn test_empty_scope_admits_everything() {
        let config = ScopeConfig::default();
        let scope = ManagedScope::new(&config);
        assert!(scope.admits(&binding(
            "User:foo",
            ResourcePattern::topic("anything", PatternType::Literal)
        )));
        assert!(scope.admits(&binding(
            "User:foo",
            ResourcePattern::group("any-group", PatternType::Literal)
        )));
    }

    #[test]
    fn test_topic_filter_only_checks_topics() {
        let config = ScopeConfig {
            topic_managed_prefixes: vec!["NamespaceA".to_string()],
            ..Default::default()
        };
        let scope = ManagedScope::new(&config);

        assert!(scope.admits(&binding(
            "User:foo",
            ResourcePattern::topic("NamespaceA_topic", PatternType::Literal)
        )));
        assert!(!scope.admits(&binding(
            "User:foo",
            ResourcePattern::topic("topicA", PatternType::Literal)
        )));
        assert!(scope.admits(&binding(
            "User:foo",
            ResourcePattern::group("other", PatternType::Literal)
        )));
    }

    #[test]
    fn test_wildcard_group_passes_group_filter() {
        let config = ScopeConfig {
            group_managed_prefixes: vec!["NamespaceA".to_string()],
            ..Default::default()
        };
        let scope = ManagedScope::new(&config);

        assert!(scope.admits(&binding("User:foo", ResourcePattern::group("*", PatternType::Literal))));
        assert!(!scope.admits(&binding(
            "User:foo",
            ResourcePattern::group("NamespaceB_group", PatternType::Literal)
        )));
    }

    #[test]
    fn test_service_account_filter_applies_to_every_binding() {
        let config = ScopeConfig {
            service_account_managed_prefixes: vec!["User:NamespaceA".to_string()],
            ..Default::default()
        };
        let scope = ManagedScope::new(&config);

        assert!(!scope.admits(&binding(
            "User:NamespaceB_app",
            ResourcePattern::group("*", PatternType::Literal)
        )));
        assert!(!scope.admits(&TopologyAclBinding::role("User:NamespaceB_app", "Operator", "kafka-cluster")));
        assert!(scope.admits(&binding(
            "User:NamespaceA_app",
            ResourcePattern::topic("foo", PatternType::Literal)
        )));
    }

    #[test]
    fn test_manages_topic() {
        let config = ScopeConfig {
            topic_managed_prefixes: vec!["NamespaceA".to_string()],
            ..Default::default()
        };
        let scope = ManagedScope::new(&config);
        assert!(scope.manages_topic("NamespaceA_orders"));
        assert!(!scope.manages_topic("orders"));
        assert!(!scope.manages(&binding(
            "User:foo",
            ResourcePattern::topic("_schemas", PatternType::Literal)
        )));
    }

    #[test]
    fn test_internal_topics() {
        let config = ScopeConfig::default();
        let scope = ManagedScope::new(&config);
        assert!(scope.is_internal(&binding(
            "User:foo",
            ResourcePattern::topic("_schemas", PatternType::Literal)
        )));
        assert!(!scope.is_internal(&binding(
            "User:foo",
            ResourcePattern::group("_group", PatternType::Literal)
        )));
    }
}
