use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Primary lookup failed: {message}")]
    PrimaryLookup { message: String },

    #[error("'{command}' not found")]
    ToolNotFound { command: String },

    #[error("Unexpected resolver output: {output:?}")]
    MalformedOutput { output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Local database error: {0}")]
    Database(String),
}

impl CheckError {
    pub fn primary(message: impl Into<String>) -> Self {
        Self::PrimaryLookup {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
