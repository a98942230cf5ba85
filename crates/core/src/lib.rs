pub mod config;
pub mod domain;
pub mod errors;
pub mod recs;
pub mod store;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::activity::{ActivityRecord, ActivityType};
pub use domain::order::{Order, OrderId, OrderLine};
pub use domain::product::{Product, ProductId};
pub use domain::user::UserId;
pub use errors::{DomainError, RecommendationError};
pub use recs::{
    similarity_score, RecResult, RecommendationKind, RecommendationSet, Recommender,
    DEFAULT_BOUGHT_TOGETHER_LIMIT, DEFAULT_FEED_LIMIT, DEFAULT_SIMILAR_LIMIT,
};
pub use store::{ActivityLog, OrderLookup, ProductCatalog, StoreError, StoreResult};
