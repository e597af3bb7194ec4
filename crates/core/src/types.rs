use thiserror::Error;

/// The main error type for Torte operations
#[derive(Debug, Error)]
pub enum TorteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{task}' depends on '{dependency}' which was never registered")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    #[error("Target task '{0}' not found")]
    TargetNotFound(String),

    #[error("Task '{task}' failed: {cause:#}")]
    Action { task: String, cause: anyhow::Error },
}

/// Result type alias for Torte operations
pub type TorteResult<T> = Result<T, TorteError>;
