use serde::Serialize;
use thiserror::Error;

use crate::model::ProviderError;

/// Fatal gateway errors.
///
/// Tool-level failures never appear here; they are folded into
/// [`ToolCallResult`](crate::ToolCallResult) and handed back to the model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing server URL or API key, malformed URL, or an empty catalog.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A provider-issued tool call that maps to no catalog entry.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The completion API itself failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Tool discovery against the backend server failed.
    #[error("tool server error: {0}")]
    Backend(mcp::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::Provider(_) => "provider_error",
            Self::Backend(_) => "backend_error",
        }
    }

    /// The structured object fatal errors are surfaced to callers as.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<mcp::Error> for Error {
    fn from(error: mcp::Error) -> Self {
        match error {
            mcp::Error::InvalidUrl(message) => Self::Configuration(message),
            other => Self::Backend(other),
        }
    }
}

/// Serializable `{code, message}` error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;
