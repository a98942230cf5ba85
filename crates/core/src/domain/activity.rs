use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::{Product, ProductId};
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    View,
    CartAdd,
    Purchase,
    Wishlist,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::CartAdd => "cart_add",
            Self::Purchase => "purchase",
            Self::Wishlist => "wishlist",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "cart_add" => Ok(Self::CartAdd),
            "purchase" => Ok(Self::Purchase),
            "wishlist" => Ok(Self::Wishlist),
            other => Err(DomainError::UnknownActivityType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked user-product interaction. Immutable once written; the log is
/// append-only. Category and price are snapshots taken at interaction time
/// and may diverge from the current product record, so recommenders treat
/// them as historical signal rather than current truth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub activity_type: ActivityType,
    pub category: String,
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Snapshot an interaction against the product's current state.
    pub fn capture(user_id: UserId, product: &Product, activity_type: ActivityType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            product_id: product.id.clone(),
            activity_type,
            category: product.category.clone(),
            price: product.price,
            recorded_at: Utc::now(),
        }
    }
}
