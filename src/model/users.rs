//! Principals and the roles they play in a topology

use crate::acl::{ResourcePattern, ResourceType};

use serde::{Deserialize, Serialize};

/// Group every consumer joins unless it names its own
pub const ANY_GROUP: &str = "*";

pub const DEFAULT_CONNECT_STATUS_TOPIC: &str = "connect-status";
pub const DEFAULT_CONNECT_OFFSET_TOPIC: &str = "connect-offsets";
pub const DEFAULT_CONNECT_CONFIGS_TOPIC: &str = "connect-configs";
pub const DEFAULT_CONNECT_GROUP: &str = "connect-cluster";
pub const DEFAULT_KSQL_DB_ID: &str = "default_";

/// A bare principal, used for observers and RBAC role members
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub principal: String,
}

impl User {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Consumer {
    pub principal: String,
    /// Custom consumer group id; a trailing `*` marks a group prefix
    #[serde(default)]
    pub group: Option<String>,
}

impl Consumer {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            group: None,
        }
    }

    pub fn with_group(principal: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            group: Some(group.into()),
        }
    }

    pub fn group_string(&self) -> &str {
        self.group.as_deref().unwrap_or(ANY_GROUP)
    }

    pub fn group_pattern(&self) -> ResourcePattern {
        ResourcePattern::from_wildcard(ResourceType::Group, self.group_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Producer {
    pub principal: String,
    /// Transactional id; a trailing `*` marks a transactional id prefix
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub idempotence: bool,
}

impl Producer {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            transaction_id: None,
            idempotence: false,
        }
    }

    pub fn with_transaction(
        principal: impl Into<String>,
        transaction_id: Option<&str>,
        idempotence: bool,
    ) -> Self {
        Self {
            principal: principal.into(),
            transaction_id: transaction_id.map(str::to_string),
            idempotence,
        }
    }

    pub fn transaction_pattern(&self) -> Option<ResourcePattern> {
        self.transaction_id
            .as_deref()
            .map(|id| ResourcePattern::from_wildcard(ResourceType::TransactionalId, id))
    }
}

/// Topics an application reads from and writes to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicAccess {
    pub read: Vec<String>,
    pub write: Vec<String>,
}

impl TopicAccess {
    pub fn new(read: &[&str], write: &[&str]) -> Self {
        Self {
            read: read.iter().map(|t| t.to_string()).collect(),
            write: write.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Stream processing application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KStream {
    pub principal: String,
    #[serde(default)]
    pub topics: TopicAccess,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub exactly_once: bool,
    /// Read-only monitoring principals
    #[serde(default)]
    pub observer_principals: Vec<User>,
}

impl KStream {
    pub fn new(principal: impl Into<String>, topics: TopicAccess) -> Self {
        Self {
            principal: principal.into(),
            topics,
            application_id: None,
            exactly_once: false,
            observer_principals: Vec::new(),
        }
    }

    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn with_exactly_once(mut self, exactly_once: bool) -> Self {
        self.exactly_once = exactly_once;
        self
    }

    pub fn with_observers(mut self, observers: Vec<User>) -> Self {
        self.observer_principals = observers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connector {
    pub principal: String,
    #[serde(default)]
    pub topics: TopicAccess,
    #[serde(default)]
    pub status_topic: Option<String>,
    #[serde(default)]
    pub offset_topic: Option<String>,
    #[serde(default)]
    pub configs_topic: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl Connector {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            topics: TopicAccess::default(),
            status_topic: None,
            offset_topic: None,
            configs_topic: None,
            group: None,
        }
    }

    pub fn with_topics(mut self, topics: TopicAccess) -> Self {
        self.topics = topics;
        self
    }

    pub fn status_topic(&self) -> &str {
        self.status_topic.as_deref().unwrap_or(DEFAULT_CONNECT_STATUS_TOPIC)
    }

    pub fn offset_topic(&self) -> &str {
        self.offset_topic.as_deref().unwrap_or(DEFAULT_CONNECT_OFFSET_TOPIC)
    }

    pub fn configs_topic(&self) -> &str {
        self.configs_topic.as_deref().unwrap_or(DEFAULT_CONNECT_CONFIGS_TOPIC)
    }

    pub fn group_string(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_CONNECT_GROUP)
    }

    /// Writes into the cluster
    pub fn is_source(&self) -> bool {
        !self.topics.write.is_empty()
    }

    /// Reads out of the cluster
    pub fn is_sink(&self) -> bool {
        !self.topics.read.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KSqlApp {
    pub principal: String,
    #[serde(default)]
    pub topics: TopicAccess,
    #[serde(default)]
    pub ksql_db_id: Option<String>,
}

impl KSqlApp {
    pub fn new(principal: impl Into<String>, topics: TopicAccess) -> Self {
        Self {
            principal: principal.into(),
            topics,
            ksql_db_id: None,
        }
    }

    pub fn ksql_db_id(&self) -> &str {
        self.ksql_db_id.as_deref().unwrap_or(DEFAULT_KSQL_DB_ID)
    }
}

/// A principal holding a catalog-defined role over a set of topics
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomRoleAssignment {
    pub role: String,
    pub principal: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl CustomRoleAssignment {
    pub fn new(role: impl Into<String>, principal: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            role: role.into(),
            principal: principal.into(),
            topics,
        }
    }
}
