//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading, saving or resolving client config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config or credential file.
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a config file.
    #[error("failed to write '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse or serialize YAML.
    #[error("invalid client config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Context not found.
    #[error("context '{0}' not found")]
    ContextNotFound(String),

    /// No server URL from any source.
    #[error("no server configured; pass --server, set DEVDASH_SERVER or add a context")]
    NoServer,

    /// Config directory could not be determined.
    #[error("could not determine the config directory")]
    NoConfigDir,
}
