//! Cluster-wide platform components

use super::users::User;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_SCHEMAS_TOPIC: &str = "_schemas";
pub const DEFAULT_SCHEMA_REGISTRY_GROUP: &str = "schema-registry";
pub const DEFAULT_CONTROL_CENTER_APP_ID: &str = "confluent-controlcenter";

/// Role name to the principals holding it
pub type RbacRoles = BTreeMap<String, Vec<User>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Kafka,
    KafkaConnect,
    SchemaRegistry,
    ControlCenter,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Kafka => "kafka",
            Component::KafkaConnect => "kafka-connect",
            Component::SchemaRegistry => "schema-registry",
            Component::ControlCenter => "control-center",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistryInstance {
    pub principal: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl SchemaRegistryInstance {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            topic: None,
            group: None,
        }
    }

    pub fn topic_string(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_SCHEMAS_TOPIC)
    }

    pub fn group_string(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_SCHEMA_REGISTRY_GROUP)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCenterInstance {
    pub principal: String,
    #[serde(default)]
    pub app_id: Option<String>,
}

impl ControlCenterInstance {
    pub fn new(principal: impl Into<String>, app_id: Option<&str>) -> Self {
        Self {
            principal: principal.into(),
            app_id: app_id.map(str::to_string),
        }
    }

    pub fn app_id_string(&self) -> &str {
        self.app_id.as_deref().unwrap_or(DEFAULT_CONTROL_CENTER_APP_ID)
    }
}

/// A platform component: optional named instances plus an optional role map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformComponent<I> {
    #[serde(default = "Vec::new")]
    pub instances: Vec<I>,
    #[serde(default)]
    pub rbac: Option<RbacRoles>,
}

impl<I> Default for PlatformComponent<I> {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
            rbac: None,
        }
    }
}

impl<I> PlatformComponent<I> {
    pub fn with_instances(instances: Vec<I>) -> Self {
        Self {
            instances,
            rbac: None,
        }
    }

    pub fn with_rbac(mut self, rbac: RbacRoles) -> Self {
        self.rbac = Some(rbac);
        self
    }
}

/// One (role, principal) pair of a component's role map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbacAssignment<'a> {
    pub component: Component,
    pub role: &'a str,
    pub principal: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    pub kafka: Option<PlatformComponent<()>>,
    pub kafka_connect: Option<PlatformComponent<()>>,
    pub schema_registry: Option<PlatformComponent<SchemaRegistryInstance>>,
    pub control_center: Option<PlatformComponent<ControlCenterInstance>>,
}

impl Platform {
    /// Every role assignment across components, in component then role order
    pub fn rbac_assignments(&self) -> Vec<RbacAssignment<'_>> {
        let maps = [
            (Component::Kafka, self.kafka.as_ref().and_then(|c| c.rbac.as_ref())),
            (
                Component::KafkaConnect,
                self.kafka_connect.as_ref().and_then(|c| c.rbac.as_ref()),
            ),
            (
                Component::SchemaRegistry,
                self.schema_registry.as_ref().and_then(|c| c.rbac.as_ref()),
            ),
            (
                Component::ControlCenter,
                self.control_center.as_ref().and_then(|c| c.rbac.as_ref()),
            ),
        ];

        let mut assignments = Vec::new();
        for (component, rbac) in maps {
            let Some(rbac) = rbac else { continue };
            for (role, users) in rbac {
                for user in users {
                    assignments.push(RbacAssignment {
                        component,
                        role,
                        principal: &user.principal,
                    });
                }
            }
        }
        assignments
    }

    pub fn schema_registry_instances(&self) -> &[SchemaRegistryInstance] {
        self.schema_registry
            .as_ref()
            .map(|c| c.instances.as_slice())
            .unwrap_or_default()
    }

    pub fn control_center_instances(&self) -> &[ControlCenterInstance] {
        self.control_center
            .as_ref()
            .map(|c| c.instances.as_slice())
            .unwrap_or_default()
    }
}
