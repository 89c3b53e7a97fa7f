use thiserror::Error;

pub type Result<T, E = WalletError> = std::result::Result<T, E>;

/// Crate-wide error taxonomy.
///
/// Every operation fails fast with the most specific kind; the variant is the
/// stable half of the contract and the message the human-readable half.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl WalletError {
    pub fn internal<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Box::new(source))
    }
}

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl From<csv::Error> for WalletError {
    fn from(err: csv::Error) -> Self {
        Self::internal(err)
    }
}

impl From<jsonwebtoken::errors::Error> for WalletError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Forbidden(format!("invalid token: {err}"))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for WalletError {
    fn from(err: rocksdb::Error) -> Self {
        Self::internal(err)
    }
}
