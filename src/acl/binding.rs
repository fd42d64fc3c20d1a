//! Access control bindings
//!
//! A [`TopologyAclBinding`] is the unit this crate produces, persists and diffs.
//! Equality, ordering and hashing are by full value.

use super::{PatternType, ResourcePattern, ResourceType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host every generated binding applies to
pub const ANY_HOST: &str = "*";

/// ACL operation enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclOperation {
    /// All operations (wildcard)
    All,

    /// Consume from topics, join groups
    Read,

    /// Produce to topics, use transactional ids
    Write,

    /// Create resources
    Create,

    /// Delete resources
    Delete,

    /// Alter resources
    Alter,

    /// Read resource metadata
    Describe,

    /// Broker-to-broker cluster actions
    ClusterAction,

    /// Read resource configuration
    DescribeConfigs,

    /// Change resource configuration
    AlterConfigs,

    /// Idempotent produce
    IdempotentWrite,
}

impl AclOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclOperation::All => "ALL",
            AclOperation::Read => "READ",
            AclOperation::Write => "WRITE",
            AclOperation::Create => "CREATE",
            AclOperation::Delete => "DELETE",
            AclOperation::Alter => "ALTER",
            AclOperation::Describe => "DESCRIBE",
            AclOperation::ClusterAction => "CLUSTER_ACTION",
            AclOperation::DescribeConfigs => "DESCRIBE_CONFIGS",
            AclOperation::AlterConfigs => "ALTER_CONFIGS",
            AclOperation::IdempotentWrite => "IDEMPOTENT_WRITE",
        }
    }
}

impl fmt::Display for AclOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a binding grants: a plain ACL operation or a named platform role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Acl(AclOperation),
    Role(String),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Acl(op) => write!(f, "{}", op),
            Operation::Role(role) => write!(f, "ROLE {}", role),
        }
    }
}

/// Effect of a binding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    /// Allow the operation
    Allow,

    /// Deny the operation
    Deny,
}

/// One access-control grant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopologyAclBinding {
    resource: ResourcePattern,
    principal: String,
    operation: Operation,
    host: String,
    effect: Effect,
}

impl TopologyAclBinding {
    /// Allow `operation` on `resource` for `principal`
    pub fn allow(principal: impl Into<String>, resource: ResourcePattern, operation: AclOperation) -> Self {
        Self {
            resource,
            principal: principal.into(),
            operation: Operation::Acl(operation),
            host: ANY_HOST.to_string(),
            effect: Effect::Allow,
        }
    }

    /// Assign `role` to `principal` at the scope of the named cluster
    pub fn role(principal: impl Into<String>, role: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            resource: ResourcePattern::cluster(cluster),
            principal: principal.into(),
            operation: Operation::Role(role.into()),
            host: ANY_HOST.to_string(),
            effect: Effect::Allow,
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn resource(&self) -> &ResourcePattern {
        &self.resource
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource.resource_type
    }

    pub fn resource_name(&self) -> &str {
        &self.resource.name
    }

    pub fn pattern_type(&self) -> PatternType {
        self.resource.pattern_type
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }
}

impl fmt::Display for TopologyAclBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effect = match self.effect {
            Effect::Allow => "ALLOW",
            Effect::Deny => "DENY",
        };
        write!(
            f,
            "{} {} {} on {} from {}",
            effect, self.principal, self.operation, self.resource, self.host
        )
    }
}
