mod config;
mod error;
mod paths;
mod settings;

pub use config::ConfigStore;
pub use error::ConfigError;
pub use paths::{default_config_path, resolve_data_path};
pub use settings::*;
