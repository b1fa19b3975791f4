use crate::db::StoreError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// True when the caller sent bad input, as opposed to a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}
