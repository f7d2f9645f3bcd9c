use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("topology entry '{0}' does not match the persisted layout")]
    ConfigMismatch(String),

    #[error("instance '{instance}' has services on multiple hosts: {hosts:?}")]
    Inconsistency { instance: String, hosts: Vec<String> },

    #[error("port allocation would end at {end}, past the configured maximum {max}")]
    PortExhaustion { end: u64, max: u16 },

    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("state persistence failed: {0}")]
    State(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
