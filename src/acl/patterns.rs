//! Resource Patterns for ACL Bindings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// Topic resource
    Topic,

    /// Consumer group resource
    Group,

    /// Cluster resource
    Cluster,

    /// Transactional id resource
    TransactionalId,
}

/// How a resource name is matched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    /// Exact name match
    Literal,

    /// Every resource whose name starts with the given name
    Prefixed,
}

/// A resource as addressed by a binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePattern {
    /// Type of resource
    pub resource_type: ResourceType,

    /// Resource name or name prefix
    pub name: String,

    /// Match mode for the name
    pub pattern_type: PatternType,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Topic => "TOPIC",
            ResourceType::Group => "GROUP",
            ResourceType::Cluster => "CLUSTER",
            ResourceType::TransactionalId => "TRANSACTIONAL_ID",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Literal => "LITERAL",
            PatternType::Prefixed => "PREFIXED",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResourcePattern {
    /// Create a new resource pattern
    pub fn new(resource_type: ResourceType, name: impl Into<String>, pattern_type: PatternType) -> Self {
        Self {
            resource_type,
            name: name.into(),
            pattern_type,
        }
    }

    /// Create a topic pattern
    pub fn topic(name: impl Into<String>, pattern_type: PatternType) -> Self {
        Self::new(ResourceType::Topic, name, pattern_type)
    }

    /// Create a consumer group pattern
    pub fn group(name: impl Into<String>, pattern_type: PatternType) -> Self {
        Self::new(ResourceType::Group, name, pattern_type)
    }

    /// Create a transactional id pattern
    pub fn transactional_id(name: impl Into<String>, pattern_type: PatternType) -> Self {
        Self::new(ResourceType::TransactionalId, name, pattern_type)
    }

    /// Create a cluster pattern; clusters are always addressed literally
    pub fn cluster(name: impl Into<String>) -> Self {
        Self::new(ResourceType::Cluster, name, PatternType::Literal)
    }

    /// Parse a name that may carry a trailing `*` wildcard marker.
    ///
    /// `"foo*"` becomes a prefixed match on `"foo"`; a bare `"*"` and any name
    /// without the marker stay literal.
    pub fn from_wildcard(resource_type: ResourceType, name: &str) -> Self {
        match name.strip_suffix('*') {
            Some(prefix) if !prefix.is_empty() => {
                Self::new(resource_type, prefix, PatternType::Prefixed)
            }
            _ => Self::new(resource_type, name, PatternType::Literal),
        }
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.resource_type, self.name, self.pattern_type)
    }
}
