use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 正規化できないエラーに使うコード
pub const UNEXPECTED_ERROR_CODE: u16 = 500;

/// 正規化できないエラーに使うメッセージ
pub const UNEXPECTED_ERROR_MESSAGE: &str = "unexpected error";

/// Normalized failure of an outbound API request.
///
/// Every failure path of the request client ends up in this shape: HTTP
/// errors keep their status code and status text, everything else becomes
/// [`ApiError::unexpected`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unexpected() -> Self {
        Self::new(UNEXPECTED_ERROR_CODE, UNEXPECTED_ERROR_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryParseError {
    #[error("repository must be in the format 'owner/repo'")]
    MissingSeparator,
    #[error("repository must contain exactly one '/' separator")]
    TooManySeparators,
    #[error("repository owner and name must not be empty")]
    EmptySegment,
    #[error("repository owner and name may only contain letters, digits, '.', '-' and '_'")]
    InvalidCharacter,
    #[error("repository owner and name must not be '.' or '..'")]
    DotSegment,
}
