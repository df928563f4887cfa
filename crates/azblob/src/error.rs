use reqwest::StatusCode;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("container '{0}' does not exist")]
    ContainerNotFound(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("storage service returned {status} ({})", .code.as_deref().unwrap_or("no error code"))]
    Status {
        status: StatusCode,
        code: Option<String>,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("failed to write blob content: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn request(url: &str, source: reqwest::Error) -> Self {
        StorageError::Request {
            url: url.to_string(),
            source,
        }
    }

    /// Build a `Status` error from a failed response, keeping the service error code
    pub(crate) fn from_response(response: &reqwest::Response) -> Self {
        let code = response
            .headers()
            .get("x-ms-error-code")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        StorageError::Status {
            status: response.status(),
            code,
        }
    }
}
