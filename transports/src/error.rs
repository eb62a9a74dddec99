use thiserror::Error;

/// A transport could not be constructed from its configuration.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
