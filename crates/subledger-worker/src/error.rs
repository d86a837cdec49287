use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Database error: {0}")]
    Db(#[from] subledger_db::DbError),

    #[error("Notification error: {0}")]
    Notify(#[from] subledger_notify::NotifyError),

    #[error("Configuration error: {0}")]
    Config(#[from] subledger_core::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
