use thiserror::Error;

use crate::domain::activity::ActivityType;
use crate::domain::product::ProductId;
use crate::store::StoreError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown activity type `{0}` (expected view|cart_add|purchase|wishlist)")]
    UnknownActivityType(String),
    #[error("activity type `{0}` cannot be tracked directly")]
    UntrackableActivity(ActivityType),
}

/// Failure surface of the recommendation engines.
///
/// `ProductNotFound` is only raised where the base entity is essential
/// (similar-products, tracking); engines that use the base product as a
/// ranking hint degrade to a fallback instead.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
