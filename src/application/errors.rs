use crate::domain::errors::{ApiError, RepositoryParseError};
use thiserror::Error;

/// 入力検証エラーに使うコード
pub const INVALID_INPUT_CODE: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    InvalidRepository(#[from] RepositoryParseError),
    #[error(transparent)]
    Request(#[from] ApiError),
}

impl DashboardError {
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidRepository(_) => INVALID_INPUT_CODE,
            Self::Request(error) => error.code,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidRepository(error) => error.to_string(),
            Self::Request(error) => error.message.clone(),
        }
    }

    /// Collapses either kind into the `{code, message}` shape shown to users.
    pub fn normalized(&self) -> ApiError {
        ApiError::new(self.code(), self.message())
    }
}
