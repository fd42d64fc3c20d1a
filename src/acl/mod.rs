//! Access control bindings and the rules that generate them
//!
//! This module holds the binding value types, resource patterns, the custom
//! role catalog and the per-role generation rules.

pub mod binding;
pub mod builder;
pub mod patterns;
pub mod roles;

pub use binding::{AclOperation, Effect, Operation, TopologyAclBinding, ANY_HOST};
pub use builder::{AclsBindingsBuilder, BindingRequest, BindingScope, BindingsBuilder};
pub use patterns::{PatternType, ResourcePattern, ResourceType};
pub use roles::{RoleAcl, RoleCatalog, RoleDefinition};
