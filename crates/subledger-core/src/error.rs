use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config path `{0}` runs through a value that is not an object")]
    NotAnObject(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not find a configuration directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
