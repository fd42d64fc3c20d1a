//! Binding generation rules
//!
//! Every method is a pure function of its arguments and the configuration the
//! builder was created with. The orchestrator talks to the [`BindingsBuilder`]
//! trait so generation can be observed or replaced in tests.

use super::roles::RoleCatalog;
use super::{AclOperation, PatternType, ResourcePattern, TopologyAclBinding};
use crate::config::{AclsConfig, Config, PlatformConfig};
use crate::error::{Result, TopologyError};
use crate::model::{
    Component, Connector, Consumer, ControlCenterInstance, KSqlApp, KStream, Producer,
    SchemaRegistryInstance,
};

use std::fmt;
use tracing::debug;

const CONSUMER_OFFSETS_TOPIC: &str = "__consumer_offsets";
const CONTROL_CENTER_TOPICS: [&str; 3] = [
    "_confluent-monitoring",
    "_confluent-command",
    "_confluent-metrics",
];
const KSQL_INTERNAL_PREFIX: &str = "_confluent-ksql-";

/// Where consumer/producer bindings point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingScope {
    /// One fully qualified topic
    Literal(String),
    /// Every topic under a project prefix
    Prefixed(String),
}

impl fmt::Display for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingScope::Literal(topic) => write!(f, "topic {}", topic),
            BindingScope::Prefixed(prefix) => write!(f, "prefix {}", prefix),
        }
    }
}

/// One logical unit of generation work
#[derive(Debug, Clone)]
pub enum BindingRequest<'a> {
    Consumers {
        consumers: Vec<Consumer>,
        scope: BindingScope,
    },
    Producers {
        producers: Vec<Producer>,
        scope: BindingScope,
    },
    Stream {
        app: &'a KStream,
        prefix: String,
    },
    Connector {
        connector: &'a Connector,
    },
    KSqlApp {
        app: &'a KSqlApp,
    },
    SchemaRegistry {
        instance: &'a SchemaRegistryInstance,
    },
    ControlCenter {
        instance: &'a ControlCenterInstance,
    },
    ClusterRole {
        role: &'a str,
        principal: &'a str,
        component: Component,
    },
    CustomRole {
        role: &'a str,
        principal: &'a str,
        topic: &'a str,
    },
}

impl BindingRequest<'_> {
    /// The single topic a request is scoped to, if any
    pub fn literal_topic(&self) -> Option<&str> {
        match self {
            BindingRequest::Consumers {
                scope: BindingScope::Literal(topic),
                ..
            }
            | BindingRequest::Producers {
                scope: BindingScope::Literal(topic),
                ..
            } => Some(topic.as_str()),
            BindingRequest::CustomRole { topic, .. } => Some(*topic),
            _ => None,
        }
    }

    /// Human readable summary used for reporting
    pub fn describe(&self) -> String {
        match self {
            BindingRequest::Consumers { consumers, scope } => format!(
                "consumers [{}] on {}",
                join_principals(consumers.iter().map(|c| c.principal.as_str())),
                scope
            ),
            BindingRequest::Producers { producers, scope } => format!(
                "producers [{}] on {}",
                join_principals(producers.iter().map(|p| p.principal.as_str())),
                scope
            ),
            BindingRequest::Stream { app, prefix } => {
                format!("stream application {} under prefix {}", app.principal, prefix)
            }
            BindingRequest::Connector { connector } => {
                format!("connector {}", connector.principal)
            }
            BindingRequest::KSqlApp { app } => {
                format!("ksql application {} ({})", app.principal, app.ksql_db_id())
            }
            BindingRequest::SchemaRegistry { instance } => {
                format!("schema registry instance {}", instance.principal)
            }
            BindingRequest::ControlCenter { instance } => format!(
                "control center instance {} ({})",
                instance.principal,
                instance.app_id_string()
            ),
            BindingRequest::ClusterRole {
                role,
                principal,
                component,
            } => format!("role {} for {} on {}", role, principal, component),
            BindingRequest::CustomRole {
                role,
                principal,
                topic,
            } => format!("custom role {} for {} on {}", role, principal, topic),
        }
    }
}

fn join_principals<'a>(principals: impl Iterator<Item = &'a str>) -> String {
    principals.collect::<Vec<_>>().join(", ")
}

pub trait BindingsBuilder {
    fn literal_bindings_for_consumers(
        &self,
        consumers: &[Consumer],
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn prefixed_bindings_for_consumers(
        &self,
        consumers: &[Consumer],
        prefix: &str,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn literal_bindings_for_producers(
        &self,
        producers: &[Producer],
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn prefixed_bindings_for_producers(
        &self,
        producers: &[Producer],
        prefix: &str,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn bindings_for_kstream(&self, app: &KStream, prefix: &str) -> Result<Vec<TopologyAclBinding>>;

    fn bindings_for_connect(&self, connector: &Connector) -> Result<Vec<TopologyAclBinding>>;

    fn bindings_for_ksql_app(&self, app: &KSqlApp) -> Result<Vec<TopologyAclBinding>>;

    fn bindings_for_schema_registry(
        &self,
        instance: &SchemaRegistryInstance,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn bindings_for_control_center(
        &self,
        principal: &str,
        app_id: &str,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn set_cluster_level_role(
        &self,
        role: &str,
        principal: &str,
        component: Component,
    ) -> Result<Vec<TopologyAclBinding>>;

    fn bindings_for_custom_role(
        &self,
        role: &str,
        principal: &str,
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>>;

    /// Dispatch a request to the matching generation method
    fn build(&self, request: &BindingRequest<'_>) -> Result<Vec<TopologyAclBinding>> {
        match request {
            BindingRequest::Consumers { consumers, scope } => match scope {
                BindingScope::Literal(topic) => self.literal_bindings_for_consumers(consumers, topic),
                BindingScope::Prefixed(prefix) => {
                    self.prefixed_bindings_for_consumers(consumers, prefix)
                }
            },
            BindingRequest::Producers { producers, scope } => match scope {
                BindingScope::Literal(topic) => self.literal_bindings_for_producers(producers, topic),
                BindingScope::Prefixed(prefix) => {
                    self.prefixed_bindings_for_producers(producers, prefix)
                }
            },
            BindingRequest::Stream { app, prefix } => self.bindings_for_kstream(app, prefix),
            BindingRequest::Connector { connector } => self.bindings_for_connect(connector),
            BindingRequest::KSqlApp { app } => self.bindings_for_ksql_app(app),
            BindingRequest::SchemaRegistry { instance } => {
                self.bindings_for_schema_registry(instance)
            }
            BindingRequest::ControlCenter { instance } => {
                self.bindings_for_control_center(&instance.principal, instance.app_id_string())
            }
            BindingRequest::ClusterRole {
                role,
                principal,
                component,
            } => self.set_cluster_level_role(role, principal, *component),
            BindingRequest::CustomRole {
                role,
                principal,
                topic,
            } => self.bindings_for_custom_role(role, principal, topic),
        }
    }
}

/// Rules engine producing Kafka ACLs and RBAC role assignments
#[derive(Debug, Clone, Default)]
pub struct AclsBindingsBuilder {
    acls: AclsConfig,
    platform: PlatformConfig,
    roles: RoleCatalog,
}

impl AclsBindingsBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            acls: config.acls.clone(),
            platform: config.platform.clone(),
            roles: RoleCatalog::default(),
        }
    }

    /// Builder with the custom role catalog named by the configuration, if any
    pub fn from_config(config: &Config) -> Result<Self> {
        let builder = Self::new(config);
        match &config.acls.custom_roles_path {
            Some(path) => Ok(builder.with_roles(RoleCatalog::from_file(path)?)),
            None => Ok(builder),
        }
    }

    pub fn with_roles(mut self, roles: RoleCatalog) -> Self {
        self.roles = roles;
        self
    }

    fn cluster_scope(&self, component: Component) -> &str {
        match component {
            Component::Kafka => &self.platform.kafka_cluster_id,
            Component::KafkaConnect => &self.platform.kafka_connect_cluster_id,
            Component::SchemaRegistry => &self.platform.schema_registry_cluster_id,
            Component::ControlCenter => &self.platform.control_center_cluster_id,
        }
    }

    fn kafka_cluster(&self) -> ResourcePattern {
        ResourcePattern::cluster(self.cluster_scope(Component::Kafka))
    }

    fn consumer_bindings(
        &self,
        consumers: &[Consumer],
        topic: ResourcePattern,
    ) -> Vec<TopologyAclBinding> {
        let mut bindings = Vec::with_capacity(consumers.len() * 3);
        for consumer in consumers {
            let principal = consumer.principal.as_str();
            bindings.push(TopologyAclBinding::allow(principal, topic.clone(), AclOperation::Read));
            bindings.push(TopologyAclBinding::allow(
                principal,
                topic.clone(),
                AclOperation::Describe,
            ));
            bindings.push(TopologyAclBinding::allow(
                principal,
                consumer.group_pattern(),
                AclOperation::Read,
            ));
        }
        bindings
    }

    fn producer_bindings(
        &self,
        producers: &[Producer],
        topic: ResourcePattern,
    ) -> Vec<TopologyAclBinding> {
        let mut bindings = Vec::with_capacity(producers.len() * 2);
        for producer in producers {
            let principal = producer.principal.as_str();
            bindings.push(TopologyAclBinding::allow(principal, topic.clone(), AclOperation::Write));
            bindings.push(TopologyAclBinding::allow(
                principal,
                topic.clone(),
                AclOperation::Describe,
            ));

            if producer.idempotence {
                bindings.push(TopologyAclBinding::allow(
                    principal,
                    self.kafka_cluster(),
                    AclOperation::IdempotentWrite,
                ));
            }

            if let Some(transactional_id) = producer.transaction_pattern() {
                bindings.push(TopologyAclBinding::allow(
                    principal,
                    transactional_id.clone(),
                    AclOperation::Describe,
                ));
                bindings.push(TopologyAclBinding::allow(
                    principal,
                    transactional_id,
                    AclOperation::Write,
                ));
            }
        }
        bindings
    }
}

/// Reject prefixes that would match every resource
fn require_prefix<'p>(prefix: &'p str, subject: &str) -> Result<&'p str> {
    if prefix.is_empty() {
        return Err(TopologyError::prefix_resolution(
            prefix,
            format!("{} requires a non-empty resource prefix", subject),
        ));
    }
    Ok(prefix)
}

fn topic_bindings<'a>(
    principal: &'a str,
    topics: &'a [String],
    operation: AclOperation,
) -> impl Iterator<Item = TopologyAclBinding> + 'a {
    topics.iter().map(move |topic| {
        TopologyAclBinding::allow(
            principal,
            ResourcePattern::topic(topic.as_str(), PatternType::Literal),
            operation,
        )
    })
}

impl BindingsBuilder for AclsBindingsBuilder {
    fn literal_bindings_for_consumers(
        &self,
        consumers: &[Consumer],
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        Ok(self.consumer_bindings(consumers, ResourcePattern::topic(topic, PatternType::Literal)))
    }

    fn prefixed_bindings_for_consumers(
        &self,
        consumers: &[Consumer],
        prefix: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        let prefix = require_prefix(prefix, "prefixed consumer bindings")?;
        Ok(self.consumer_bindings(consumers, ResourcePattern::topic(prefix, PatternType::Prefixed)))
    }

    fn literal_bindings_for_producers(
        &self,
        producers: &[Producer],
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        Ok(self.producer_bindings(producers, ResourcePattern::topic(topic, PatternType::Literal)))
    }

    fn prefixed_bindings_for_producers(
        &self,
        producers: &[Producer],
        prefix: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        let prefix = require_prefix(prefix, "prefixed producer bindings")?;
        Ok(self.producer_bindings(producers, ResourcePattern::topic(prefix, PatternType::Prefixed)))
    }

    fn bindings_for_kstream(&self, app: &KStream, prefix: &str) -> Result<Vec<TopologyAclBinding>> {
        let prefix = app.application_id.as_deref().unwrap_or(prefix);
        let prefix = require_prefix(prefix, "stream application bindings")?;
        let principal = app.principal.as_str();

        let mut bindings: Vec<TopologyAclBinding> =
            topic_bindings(principal, &app.topics.read, AclOperation::Read)
                .chain(topic_bindings(principal, &app.topics.write, AclOperation::Write))
                .collect();

        let group = ResourcePattern::group(prefix, PatternType::Prefixed);
        let internal_topics = ResourcePattern::topic(prefix, PatternType::Prefixed);

        bindings.push(TopologyAclBinding::allow(principal, group.clone(), AclOperation::Read));
        bindings.push(TopologyAclBinding::allow(
            principal,
            internal_topics.clone(),
            AclOperation::All,
        ));

        for observer in &app.observer_principals {
            let observer = observer.principal.as_str();
            bindings.push(TopologyAclBinding::allow(observer, group.clone(), AclOperation::Read));
            bindings.push(TopologyAclBinding::allow(
                observer,
                internal_topics.clone(),
                AclOperation::Read,
            ));
            bindings.push(TopologyAclBinding::allow(
                observer,
                internal_topics.clone(),
                AclOperation::Describe,
            ));
        }

        if app.exactly_once {
            let transactional_id = ResourcePattern::transactional_id(prefix, PatternType::Prefixed);
            bindings.push(TopologyAclBinding::allow(
                principal,
                transactional_id.clone(),
                AclOperation::Describe,
            ));
            bindings.push(TopologyAclBinding::allow(
                principal,
                transactional_id,
                AclOperation::Write,
            ));
        }

        debug!(
            principal = principal,
            prefix = prefix,
            count = bindings.len(),
            "Generated stream application bindings"
        );
        Ok(bindings)
    }

    fn bindings_for_connect(&self, connector: &Connector) -> Result<Vec<TopologyAclBinding>> {
        let principal = connector.principal.as_str();
        let internal_topics = [
            connector.status_topic(),
            connector.offset_topic(),
            connector.configs_topic(),
        ];

        let mut bindings = Vec::new();
        for operation in [AclOperation::Read, AclOperation::Write] {
            for topic in internal_topics {
                bindings.push(TopologyAclBinding::allow(
                    principal,
                    ResourcePattern::topic(topic, PatternType::Literal),
                    operation,
                ));
            }
        }
        bindings.push(TopologyAclBinding::allow(
            principal,
            ResourcePattern::group(connector.group_string(), PatternType::Literal),
            AclOperation::Read,
        ));

        if self.acls.connector_allow_topic_create {
            bindings.push(TopologyAclBinding::allow(
                principal,
                self.kafka_cluster(),
                AclOperation::Create,
            ));
        }

        if connector.is_sink() {
            bindings.extend(topic_bindings(principal, &connector.topics.read, AclOperation::Read));
        }
        if connector.is_source() {
            bindings.extend(topic_bindings(principal, &connector.topics.write, AclOperation::Write));
        }

        Ok(bindings)
    }

    fn bindings_for_ksql_app(&self, app: &KSqlApp) -> Result<Vec<TopologyAclBinding>> {
        let principal = app.principal.as_str();
        let service_id = app.ksql_db_id();
        let internal = format!("{}{}", KSQL_INTERNAL_PREFIX, service_id);

        let mut bindings = vec![
            TopologyAclBinding::allow(
                principal,
                ResourcePattern::topic(internal.as_str(), PatternType::Prefixed),
                AclOperation::All,
            ),
            TopologyAclBinding::allow(
                principal,
                ResourcePattern::topic(format!("{}ksql_processing_log", service_id), PatternType::Literal),
                AclOperation::All,
            ),
            TopologyAclBinding::allow(
                principal,
                ResourcePattern::group(internal.as_str(), PatternType::Prefixed),
                AclOperation::All,
            ),
            TopologyAclBinding::allow(
                principal,
                ResourcePattern::transactional_id(service_id, PatternType::Literal),
                AclOperation::All,
            ),
            TopologyAclBinding::allow(principal, self.kafka_cluster(), AclOperation::DescribeConfigs),
        ];

        bindings.extend(topic_bindings(principal, &app.topics.read, AclOperation::Read));
        bindings.extend(topic_bindings(principal, &app.topics.write, AclOperation::Write));

        Ok(bindings)
    }

    fn bindings_for_schema_registry(
        &self,
        instance: &SchemaRegistryInstance,
    ) -> Result<Vec<TopologyAclBinding>> {
        let principal = instance.principal.as_str();
        let schemas = ResourcePattern::topic(instance.topic_string(), PatternType::Literal);

        let mut bindings: Vec<TopologyAclBinding> = [
            AclOperation::DescribeConfigs,
            AclOperation::Write,
            AclOperation::Read,
        ]
        .into_iter()
        .map(|op| TopologyAclBinding::allow(principal, schemas.clone(), op))
        .collect();

        bindings.push(TopologyAclBinding::allow(
            principal,
            ResourcePattern::topic(CONSUMER_OFFSETS_TOPIC, PatternType::Literal),
            AclOperation::Describe,
        ));
        bindings.push(TopologyAclBinding::allow(
            principal,
            ResourcePattern::group(instance.group_string(), PatternType::Literal),
            AclOperation::Read,
        ));

        Ok(bindings)
    }

    fn bindings_for_control_center(
        &self,
        principal: &str,
        app_id: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        let mut bindings = vec![
            TopologyAclBinding::allow(
                principal,
                ResourcePattern::group(app_id, PatternType::Prefixed),
                AclOperation::Read,
            ),
            TopologyAclBinding::allow(
                principal,
                ResourcePattern::group(format!("{}-command", app_id), PatternType::Prefixed),
                AclOperation::Read,
            ),
        ];

        for topic in CONTROL_CENTER_TOPICS {
            for operation in [AclOperation::Write, AclOperation::Read, AclOperation::Describe] {
                bindings.push(TopologyAclBinding::allow(
                    principal,
                    ResourcePattern::topic(topic, PatternType::Literal),
                    operation,
                ));
            }
        }

        bindings.push(TopologyAclBinding::allow(
            principal,
            ResourcePattern::topic(app_id, PatternType::Prefixed),
            AclOperation::All,
        ));
        bindings.push(TopologyAclBinding::allow(
            principal,
            self.kafka_cluster(),
            AclOperation::Describe,
        ));
        bindings.push(TopologyAclBinding::allow(
            principal,
            self.kafka_cluster(),
            AclOperation::DescribeConfigs,
        ));

        Ok(bindings)
    }

    fn set_cluster_level_role(
        &self,
        role: &str,
        principal: &str,
        component: Component,
    ) -> Result<Vec<TopologyAclBinding>> {
        Ok(vec![TopologyAclBinding::role(
            principal,
            role,
            self.cluster_scope(component),
        )])
    }

    fn bindings_for_custom_role(
        &self,
        role: &str,
        principal: &str,
        topic: &str,
    ) -> Result<Vec<TopologyAclBinding>> {
        let definition = self
            .roles
            .get(role)
            .ok_or_else(|| TopologyError::UnknownRole(role.to_string()))?;
        definition.expand(principal, topic)
    }
}
