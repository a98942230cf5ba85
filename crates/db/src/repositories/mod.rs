use storefront_core::store::StoreError;
use thiserror::Error;

pub mod activity;
pub mod order;
pub mod product;

pub use activity::SqlActivityLog;
pub use order::SqlOrderLookup;
pub use product::SqlProductCatalog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}

pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    RepositoryError::Database(error).into()
}

pub(crate) fn decode_error(message: impl Into<String>) -> StoreError {
    RepositoryError::Decode(message.into()).into()
}
