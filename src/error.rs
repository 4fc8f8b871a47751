use thiserror::Error;

/// Errors raised while loading configuration or talking to Home Assistant.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: impl Into<String>) -> Error {
    Error::Config(message.into())
}

/// Helper to create fetch errors for a single calendar source
pub fn fetch_error(source_id: &str, message: impl Into<String>) -> Error {
    Error::Fetch {
        source_id: source_id.to_string(),
        message: message.into(),
    }
}
