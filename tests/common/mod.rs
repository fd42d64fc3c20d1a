#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::Path;
use topology_acls::acl::{BindingsBuilder, TopologyAclBinding};
use topology_acls::backend::{BackendController, FileBackend};
use topology_acls::manager::AccessControlManager;
use topology_acls::model::{
    Component, Connector, Consumer, CustomRoleAssignment, KSqlApp, KStream, Producer, Project,
    SchemaRegistryInstance, Topic, Topology,
};
use topology_acls::plan::{ExecutionPlan, RunReport};
use topology_acls::provider::{AclsProvider, BindingsByResource};
use topology_acls::{Config, Result, TopologyError};

/// Builds a single-project topology the way most tests need it
#[derive(Debug, Clone)]
pub struct TestTopologyBuilder {
    context: String,
    project: Project,
    special_topics: Vec<Topic>,
}

impl TestTopologyBuilder {
    pub fn create_project() -> Self {
        Self::create_project_named("ctx", "project")
    }

    pub fn create_project_named(context: &str, project: &str) -> Self {
        Self {
            context: context.to_string(),
            project: Project::new(project),
            special_topics: Vec::new(),
        }
    }

    pub fn add_topic(mut self, name: &str) -> Self {
        self.project.add_topic(Topic::new(name));
        self
    }

    pub fn add_topic_with(mut self, topic: Topic) -> Self {
        self.project.add_topic(topic);
        self
    }

    pub fn add_consumer(mut self, principal: &str) -> Self {
        self.project.consumers.push(Consumer::new(principal));
        self
    }

    pub fn add_consumer_with_group(mut self, principal: &str, group: &str) -> Self {
        self.project.consumers.push(Consumer::with_group(principal, group));
        self
    }

    pub fn add_producer(mut self, principal: &str) -> Self {
        self.project.producers.push(Producer::new(principal));
        self
    }

    pub fn add_stream(mut self, app: KStream) -> Self {
        self.project.streams.push(app);
        self
    }

    pub fn add_connector(mut self, connector: Connector) -> Self {
        self.project.connectors.push(connector);
        self
    }

    pub fn add_ksql_app(mut self, app: KSqlApp) -> Self {
        self.project.ksql_apps.push(app);
        self
    }

    pub fn add_other(mut self, role: &str, principal: &str, topic: &str) -> Self {
        self.project
            .others
            .push(CustomRoleAssignment::new(role, principal, vec![topic.to_string()]));
        self
    }

    pub fn add_special_topic(mut self, topic: Topic) -> Self {
        self.special_topics.push(topic);
        self
    }

    pub fn remove_consumer(&mut self, principal: &str) {
        self.project.consumers.retain(|c| c.principal != principal);
        for topic in &mut self.project.topics {
            topic.consumers.retain(|c| c.principal != principal);
        }
    }

    pub fn remove_topic(&mut self, name: &str) {
        self.project.topics.retain(|t| t.name != name);
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn build_topology(&self) -> Topology {
        let mut topology = Topology::new(self.context.as_str());
        topology.add_project(self.project.clone());
        for topic in &self.special_topics {
            topology.add_special_topic(topic.clone());
        }
        topology
    }
}

/// Every call a [`RecordingBuilder`] received
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LiteralConsumers { consumers: Vec<Consumer>, topic: String },
    PrefixedConsumers { consumers: Vec<Consumer>, prefix: String },
    LiteralProducers { producers: Vec<Producer>, topic: String },
    PrefixedProducers { producers: Vec<Producer>, prefix: String },
    Stream { app: KStream, prefix: String },
    Connect(Connector),
    KSql(KSqlApp),
    SchemaRegistry(SchemaRegistryInstance),
    ControlCenter { principal: String, app_id: String },
    ClusterRole { role: String, principal: String, component: Component },
    CustomRole { role: String, principal: String, topic: String },
}

/// Builder that records its calls and returns no bindings
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    calls: Mutex<Vec<Call>>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) -> Result<Vec<TopologyAclBinding>> {
        self.calls.lock().push(call);
        Ok(Vec::new())
    }
}

impl BindingsBuilder for RecordingBuilder {
    fn literal_bindings_for_consumers(
        &self,
        consumers: &[Consumer],
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::LiteralConsumers {
            consumers: consumers.to_vec(),
            topic: topic.to_string(),
        })
    }

    fn prefixed_bindings_for_consumers(
        &self,
        consumers: &[Consumer],
        prefix: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::PrefixedConsumers {
            consumers: consumers.to_vec(),
            prefix: prefix.to_string(),
        })
    }

    fn literal_bindings_for_producers(
        &self,
        producers: &[Producer],
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::LiteralProducers {
            producers: producers.to_vec(),
            topic: topic.to_string(),
        })
    }

    fn prefixed_bindings_for_producers(
        &self,
        producers: &[Producer],
        prefix: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::PrefixedProducers {
            producers: producers.to_vec(),
            prefix: prefix.to_string(),
        })
    }

    fn bindings_for_kstream(&self, app: &KStream, prefix: &str) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::Stream {
            app: app.clone(),
            prefix: prefix.to_string(),
        })
    }

    fn bindings_for_connect(&self, connector: &Connector) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::Connect(connector.clone()))
    }

    fn bindings_for_ksql_app(&self, app: &KSqlApp) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::KSql(app.clone()))
    }

    fn bindings_for_schema_registry(
        &self,
        instance: &SchemaRegistryInstance,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::SchemaRegistry(instance.clone()))
    }

    fn bindings_for_control_center(
        &self,
        principal: &str,
        app_id: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::ControlCenter {
            principal: principal.to_string(),
            app_id: app_id.to_string(),
        })
    }

    fn set_cluster_level_role(
        &self,
        role: &str,
        principal: &str,
        component: Component,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::ClusterRole {
            role: role.to_string(),
            principal: principal.to_string(),
            component,
        })
    }

    fn bindings_for_custom_role(
        &self,
        role: &str,
        principal: &str,
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        self.record(Call::CustomRole {
            role: role.to_string(),
            principal: principal.to_string(),
            topic: topic.to_string(),
        })
    }
}

/// Provider whose mutating calls always fail
#[derive(Debug, Default)]
pub struct FailingProvider;

impl AclsProvider for FailingProvider {
    fn create_bindings(&self, _bindings: &BTreeSet<TopologyAclBinding>) -> Result<()> {
        Err(TopologyError::Provider("connection refused".to_string()))
    }

    fn clear_bindings(&self, _bindings: &BTreeSet<TopologyAclBinding>) -> Result<()> {
        Err(TopologyError::Provider("connection refused".to_string()))
    }

    fn list_acls(&self) -> Result<BindingsByResource> {
        Ok(BindingsByResource::new())
    }
}

pub fn file_plan(state_file: &Path) -> Result<ExecutionPlan<Vec<u8>>> {
    ExecutionPlan::init(BackendController::new(FileBackend::new(state_file)), Vec::new())
}

/// Generate and run one plan against a file backend
pub fn run_topology(
    config: &Config,
    builder: &dyn BindingsBuilder,
    provider: &dyn AclsProvider,
    topology: &Topology,
    state_file: &Path,
    dry_run: bool,
) -> Result<RunReport> {
    let mut plan = file_plan(state_file)?;
    let manager = AccessControlManager::new(provider, builder, config);
    manager.update_plan(topology, &mut plan)?;
    plan.run(dry_run, provider, config.delete_policy())
}
