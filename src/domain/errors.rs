use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Cart not found")]
    CartNotFound,
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Storage failures leave the service as `Internal`; everything else is
    /// already classified for the caller.
    pub fn into_internal(self) -> Self {
        match self {
            DomainError::Storage(msg) => DomainError::Internal(msg),
            other => other,
        }
    }
}
