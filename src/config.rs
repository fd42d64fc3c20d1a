use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Template value that selects the built-in naming scheme.
pub const DEFAULT_FORMAT: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub acls: AclsConfig,
    pub naming: NamingConfig,
    pub scope: ScopeConfig,
    pub deletion: DeletionConfig,
    pub state: StateConfig,
    pub platform: PlatformConfig,
}

/// Binding generation switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AclsConfig {
    /// Generate consumer/producer bindings per project prefix instead of per topic
    pub optimized: bool,
    /// Grant connectors CREATE on the cluster so they can create their own topics
    pub connector_allow_topic_create: bool,
    /// Location of the custom role catalog
    pub custom_roles_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub topic_prefix_format: String,
    pub project_prefix_format: String,
    pub separator: String,
}

/// Managed-prefix allow-lists. An empty list manages everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub topic_managed_prefixes: Vec<String>,
    pub group_managed_prefixes: Vec<String>,
    pub service_account_managed_prefixes: Vec<String>,
    /// Topics starting with one of these are never treated as user managed
    pub internal_topic_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionConfig {
    pub allow_delete_bindings: bool,
    pub allow_delete_topics: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub state_file: PathBuf,
    /// Diff against the live cluster bindings instead of the persisted state
    pub from_cluster: bool,
}

/// Cluster scope names used for RBAC role assignments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub kafka_cluster_id: String,
    pub kafka_connect_cluster_id: String,
    pub schema_registry_cluster_id: String,
    pub control_center_cluster_id: String,
}

/// Which stale bindings the execution plan is permitted to remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletePolicy {
    pub allow_delete_bindings: bool,
    pub allow_delete_topics: bool,
}

impl Default for AclsConfig {
    fn default() -> Self {
        Self {
            optimized: false,
            connector_allow_topic_create: true,
            custom_roles_path: None,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            topic_prefix_format: DEFAULT_FORMAT.to_string(),
            project_prefix_format: DEFAULT_FORMAT.to_string(),
            separator: ".".to_string(),
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            topic_managed_prefixes: Vec::new(),
            group_managed_prefixes: Vec::new(),
            service_account_managed_prefixes: Vec::new(),
            internal_topic_prefixes: vec!["_".to_string()],
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(".cluster-state"),
            from_cluster: false,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            kafka_cluster_id: "kafka-cluster".to_string(),
            kafka_connect_cluster_id: "connect-cluster".to_string(),
            schema_registry_cluster_id: "schema-registry-cluster".to_string(),
            control_center_cluster_id: "control-center".to_string(),
        }
    }
}

impl NamingConfig {
    pub fn has_custom_topic_format(&self) -> bool {
        self.topic_prefix_format != DEFAULT_FORMAT
    }

    pub fn has_custom_project_format(&self) -> bool {
        self.project_prefix_format != DEFAULT_FORMAT
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.separator.is_empty() {
            return Err(crate::error::TopologyError::InvalidConfig(
                "naming.separator cannot be empty".to_string(),
            ));
        }

        if self.has_custom_topic_format()
            && self.has_custom_project_format()
            && !self.topic_prefix_format.starts_with(&self.project_prefix_format)
        {
            return Err(crate::error::TopologyError::InvalidConfig(format!(
                "naming.topic_prefix_format '{}' must start with naming.project_prefix_format '{}'",
                self.topic_prefix_format, self.project_prefix_format
            )));
        }

        Ok(())
    }
}

impl ScopeConfig {
    pub fn validate(&self) -> crate::Result<()> {
        let lists = [
            ("scope.topic_managed_prefixes", &self.topic_managed_prefixes),
            ("scope.group_managed_prefixes", &self.group_managed_prefixes),
            (
                "scope.service_account_managed_prefixes",
                &self.service_account_managed_prefixes,
            ),
            ("scope.internal_topic_prefixes", &self.internal_topic_prefixes),
        ];

        for (name, prefixes) in lists {
            if prefixes.iter().any(|prefix| prefix.is_empty()) {
                return Err(crate::error::TopologyError::InvalidConfig(format!(
                    "{} cannot contain an empty prefix",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn is_internal_topic(&self, topic: &str) -> bool {
        self.internal_topic_prefixes
            .iter()
            .any(|prefix| topic.starts_with(prefix.as_str()))
    }
}

impl PlatformConfig {
    pub fn validate(&self) -> crate::Result<()> {
        let ids = [
            ("platform.kafka_cluster_id", &self.kafka_cluster_id),
            ("platform.kafka_connect_cluster_id", &self.kafka_connect_cluster_id),
            ("platform.schema_registry_cluster_id", &self.schema_registry_cluster_id),
            ("platform.control_center_cluster_id", &self.control_center_cluster_id),
        ];

        for (name, id) in ids {
            if id.is_empty() {
                return Err(crate::error::TopologyError::InvalidConfig(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::error::TopologyError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.naming.validate()?;
        self.scope.validate()?;
        self.platform.validate()?;
        Ok(())
    }

    pub fn has_custom_topic_format(&self) -> bool {
        self.naming.has_custom_topic_format()
    }

    pub fn is_optimized_acls(&self) -> bool {
        self.acls.optimized
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        DeletePolicy {
            allow_delete_bindings: self.deletion.allow_delete_bindings,
            allow_delete_topics: self.deletion.allow_delete_topics,
        }
    }
}
