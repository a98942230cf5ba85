//! Recommendation engines for the storefront.
//!
//! Five independent strategies over the same catalog: personalized
//! (category/price affinity from a user's history), similar (content-based
//! against one product), frequently-bought-together (order co-occurrence),
//! trending (recency-weighted activity), and a guest-safe for-you mix. Each
//! is stateless per request and degrades to a top-rated fallback when the
//! personalization signal runs out.

mod engine;
mod similarity;
mod types;

pub use engine::Recommender;
pub use similarity::similarity_score;
pub use types::{RecommendationKind, RecommendationSet};

use crate::errors::RecommendationError;

pub type RecResult<T> = Result<T, RecommendationError>;

/// Default result count for the feed-style engines.
pub const DEFAULT_FEED_LIMIT: usize = 8;

/// Default result count for similar-products.
pub const DEFAULT_SIMILAR_LIMIT: usize = 6;

/// Default result count for frequently-bought-together.
pub const DEFAULT_BOUGHT_TOGETHER_LIMIT: usize = 4;

/// How many recent views feed the personalized engine.
pub const VIEW_HISTORY_DEPTH: usize = 20;

/// Candidate fetch cap for similar-products scoring.
pub const SIMILAR_CANDIDATE_CAP: usize = 50;

/// How many preferred categories the personalized engine ranks against.
pub const TOP_CATEGORY_COUNT: usize = 3;

/// Trending aggregation window.
pub const TRENDING_WINDOW_DAYS: i64 = 7;
