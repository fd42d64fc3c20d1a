use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopologyError>;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to resolve prefix template '{template}': {reason}")]
    PrefixResolution { template: String, reason: String },

    #[error("Unknown custom role: {0}")]
    UnknownRole(String),

    #[error("Role catalog error: {0}")]
    RoleCatalog(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend state is locked by another run: {}", .0.display())]
    BackendLocked(PathBuf),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl TopologyError {
    pub(crate) fn prefix_resolution(template: impl Into<String>, reason: impl Into<String>) -> Self {
        TopologyError::PrefixResolution {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// True for errors meaning the desired state itself cannot be computed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TopologyError::Config(_)
                | TopologyError::InvalidConfig(_)
                | TopologyError::PrefixResolution { .. }
                | TopologyError::UnknownRole(_)
                | TopologyError::RoleCatalog(_)
        )
    }
}
