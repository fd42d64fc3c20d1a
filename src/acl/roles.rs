//! Custom role catalog
//!
//! Named bundles of ACL entries defined outside the topology, expanded per
//! (principal, target topic) pair. Entry resource names are templates and may
//! reference `topic` and `principal`.

use super::{AclOperation, PatternType, ResourcePattern, ResourceType, TopologyAclBinding};
use crate::error::{Result, TopologyError};
use crate::naming::render_template;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

fn default_resource_name() -> String {
    "{{topic}}".to_string()
}

/// One entry of a role definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAcl {
    pub resource_type: ResourceType,
    #[serde(default = "default_resource_name")]
    pub resource_name: String,
    pub pattern_type: PatternType,
    pub operations: Vec<AclOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    pub acls: Vec<RoleAcl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalog {
    #[serde(default)]
    roles: Vec<RoleDefinition>,
}

impl RoleDefinition {
    /// Expand every entry into concrete bindings for `principal` on `topic`
    pub fn expand(&self, principal: &str, topic: &str) -> Result<Vec<TopologyAclBinding>> {
        let mut vars = BTreeMap::new();
        vars.insert("topic", topic);
        vars.insert("principal", principal);

        let mut bindings = Vec::new();
        for acl in &self.acls {
            let name = render_template(&acl.resource_name, &vars)?;
            let resource = ResourcePattern::new(acl.resource_type, name, acl.pattern_type);
            for operation in &acl.operations {
                bindings.push(TopologyAclBinding::allow(principal, resource.clone(), *operation));
            }
        }
        Ok(bindings)
    }
}

impl RoleCatalog {
    pub fn new(roles: Vec<RoleDefinition>) -> Result<Self> {
        let catalog = Self { roles };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: RoleCatalog =
            serde_yaml::from_str(content).map_err(|e| TopologyError::RoleCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|role| role.name == name)
    }

    pub fn roles(&self) -> &[RoleDefinition] {
        &self.roles
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for role in &self.roles {
            if !seen.insert(role.name.as_str()) {
                return Err(TopologyError::RoleCatalog(format!(
                    "role '{}' is defined more than once",
                    role.name
                )));
            }
            if role.acls.iter().any(|acl| acl.operations.is_empty()) {
                return Err(TopologyError::RoleCatalog(format!(
                    "role '{}' has an entry without operations",
                    role.name
                )));
            }
        }
        Ok(())
    }
}
