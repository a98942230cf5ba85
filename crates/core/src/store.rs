//! Data-access ports consumed by the recommendation engines.
//!
//! The engines are stateless computations over externally supplied
//! collections; these traits keep them decoupled from any particular storage
//! client so the scoring logic is unit-testable without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::activity::{ActivityRecord, ActivityType};
use crate::domain::order::Order;
use crate::domain::product::{Product, ProductId};
use crate::domain::user::UserId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("data store failure: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// Resolve a batch of ids. Missing ids are silently dropped; the returned
    /// order is unspecified, callers re-order as needed.
    async fn find_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

    /// Candidates for content-based similarity: same category as the base OR
    /// price within [0.5x, 1.5x] of the base's price, excluding the base.
    async fn find_similar_candidates(&self, base: &Product, cap: usize) -> StoreResult<Vec<Product>>;

    /// Products in any of the given categories, rating then review count
    /// descending, excluding `exclude`.
    async fn find_in_categories(
        &self,
        categories: &[String],
        exclude: &[ProductId],
        cap: usize,
    ) -> StoreResult<Vec<Product>>;

    /// Products in one category, rating descending, excluding `exclude`.
    async fn find_in_category(
        &self,
        category: &str,
        exclude: &[ProductId],
        cap: usize,
    ) -> StoreResult<Vec<Product>>;

    /// Globally top-rated products (rating desc, review count desc).
    async fn top_rated(&self, exclude: &[ProductId], cap: usize) -> StoreResult<Vec<Product>>;

    /// Most recently created products.
    async fn newest(&self, cap: usize) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait OrderLookup: Send + Sync {
    /// All orders with a line item referencing the given product.
    async fn orders_containing(&self, product_id: &ProductId) -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append one record. The log accepts concurrent appends; per-user
    /// chronology is carried by `recorded_at`, not insertion order.
    async fn append(&self, record: ActivityRecord) -> StoreResult<()>;

    /// A user's most recent records of one type, `recorded_at` descending.
    async fn recent_by_user_and_type(
        &self,
        user_id: &UserId,
        activity_type: ActivityType,
        limit: usize,
    ) -> StoreResult<Vec<ActivityRecord>>;

    /// All of a user's records of one type.
    async fn all_by_user_and_type(
        &self,
        user_id: &UserId,
        activity_type: ActivityType,
    ) -> StoreResult<Vec<ActivityRecord>>;

    /// Weighted per-product activity counts since `since` (view x1,
    /// cart_add x2, purchase x5), highest score first.
    async fn trend_counts(&self, since: DateTime<Utc>) -> StoreResult<Vec<(ProductId, i64)>>;
}
