pub mod acl;
pub mod backend;
pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod naming;
pub mod plan;
pub mod provider;

pub use error::{TopologyError, Result};
pub use config::Config;
