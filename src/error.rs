use reqwest::StatusCode;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("notification record has no object key")]
    MissingKey,

    #[error("failed to download object {key}")]
    StorageRead {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to upload object {key}")]
    StorageWrite {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to build http client")]
    HttpClient(#[source] reqwest::Error),

    #[error("invalid api endpoint {0}")]
    InvalidEndpoint(String),

    #[error("compression request failed")]
    CompressionRequest(#[source] reqwest::Error),

    #[error("compression returned status {status}, expected 201 Created")]
    Compression { status: StatusCode },

    #[error("compression response has no Location header")]
    MissingLocation,

    #[error("compression response has an invalid Location header: {0}")]
    InvalidLocation(String),

    #[error("resize request failed")]
    ResizeRequest(#[source] reqwest::Error),

    #[error("resize returned status {status}, expected 200 OK")]
    Resize { status: StatusCode },
}
