use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

/// Which strategy produced a recommendation set. The serialized names are
/// the wire-level `type` values clients switch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationKind {
    #[serde(rename = "personalized")]
    Personalized,
    #[serde(rename = "similar")]
    Similar,
    #[serde(rename = "frequently-bought-together")]
    FrequentlyBoughtTogether,
    #[serde(rename = "trending")]
    Trending,
    #[serde(rename = "for-you")]
    ForYou,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personalized => "personalized",
            Self::Similar => "similar",
            Self::FrequentlyBoughtTogether => "frequently-bought-together",
            Self::Trending => "trending",
            Self::ForYou => "for-you",
        }
    }
}

/// Ranked output of one engine run.
///
/// `based_on` carries the preferred-category list the personalized engine
/// ranked against, for UI attribution; other engines leave it empty.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub kind: RecommendationKind,
    pub products: Vec<Product>,
    pub based_on: Vec<String>,
}

impl RecommendationSet {
    pub fn new(kind: RecommendationKind, products: Vec<Product>) -> Self {
        Self { kind, products, based_on: Vec::new() }
    }

    pub fn with_based_on(mut self, based_on: Vec<String>) -> Self {
        self.based_on = based_on;
        self
    }
}
