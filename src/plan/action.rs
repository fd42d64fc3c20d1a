use crate::acl::TopologyAclBinding;

use std::fmt;

/// One logical unit of work: the bindings for a single consumer group on a
/// topic, a single connector, a single role assignment and so on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    description: String,
    bindings: Vec<TopologyAclBinding>,
}

impl Action {
    /// Duplicate bindings are dropped, first occurrence wins
    pub fn new(description: impl Into<String>, bindings: Vec<TopologyAclBinding>) -> Self {
        let mut unique: Vec<TopologyAclBinding> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if !unique.contains(&binding) {
                unique.push(binding);
            }
        }
        Self {
            description: description.into(),
            bindings: unique,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bindings(&self) -> &[TopologyAclBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Action: {}", self.description)?;
        for binding in &self.bindings {
            writeln!(f, "  {}", binding)?;
        }
        Ok(())
    }
}
