//! The recommendation engines.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::domain::activity::{ActivityRecord, ActivityType};
use crate::domain::product::{Product, ProductId};
use crate::domain::user::UserId;
use crate::errors::{DomainError, RecommendationError};
use crate::store::{ActivityLog, OrderLookup, ProductCatalog};

use super::similarity::similarity_score;
use super::types::{RecommendationKind, RecommendationSet};
use super::{
    RecResult, SIMILAR_CANDIDATE_CAP, TOP_CATEGORY_COUNT, TRENDING_WINDOW_DAYS, VIEW_HISTORY_DEPTH,
};

/// Stateless recommendation service over injected data-access ports.
///
/// Every request is computed fresh from current data; the only write path is
/// the append-only activity log. Independent read-only sub-fetches within one
/// request run concurrently since they commute.
pub struct Recommender {
    catalog: Arc<dyn ProductCatalog>,
    orders: Arc<dyn OrderLookup>,
    activity: Arc<dyn ActivityLog>,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrderLookup>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self { catalog, orders, activity }
    }

    /// Content-based recommendations against one base product.
    ///
    /// The base product is essential here, so an unknown id is an error
    /// rather than a degraded result.
    pub async fn similar(&self, product_id: &ProductId, limit: usize) -> RecResult<RecommendationSet> {
        let base = self
            .catalog
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| RecommendationError::ProductNotFound(product_id.clone()))?;

        let candidates = self.catalog.find_similar_candidates(&base, SIMILAR_CANDIDATE_CAP).await?;

        let mut scored: Vec<(f64, Product)> = candidates
            .into_iter()
            .map(|candidate| (similarity_score(&base, &candidate), candidate))
            .collect();
        sort_by_score_desc(&mut scored);

        let products = scored.into_iter().take(limit).map(|(_, product)| product).collect();
        Ok(RecommendationSet::new(RecommendationKind::Similar, products))
    }

    /// Category/price affinity from the user's recent views and purchases.
    ///
    /// With no usable history this is exactly the top-rated fallback and
    /// `based_on` stays empty.
    pub async fn personalized(&self, user_id: &UserId, limit: usize) -> RecResult<RecommendationSet> {
        let (views, purchases) = tokio::join!(
            self.activity.recent_by_user_and_type(user_id, ActivityType::View, VIEW_HISTORY_DEPTH),
            self.activity.all_by_user_and_type(user_id, ActivityType::Purchase),
        );
        let views = views?;
        let purchases = purchases?;

        // Encounter order matters: category ties rank by first appearance.
        let history_ids: Vec<ProductId> =
            views.iter().chain(purchases.iter()).map(|record| record.product_id.clone()).collect();
        let resolved = self.resolve_preserving_order(&history_ids).await?;

        let mut category_counts: Vec<(String, u32)> = Vec::new();
        let mut price_range: Option<(f64, f64)> = None;
        let mut interacted: Vec<ProductId> = Vec::new();

        for product in &resolved {
            match category_counts.iter_mut().find(|(category, _)| *category == product.category) {
                Some((_, count)) => *count += 1,
                None => category_counts.push((product.category.clone(), 1)),
            }
            price_range = Some(match price_range {
                Some((min, max)) => (min.min(product.price), max.max(product.price)),
                None => (product.price, product.price),
            });
            if !interacted.contains(&product.id) {
                interacted.push(product.id.clone());
            }
        }

        // Stable sort keeps encounter order within equal counts.
        category_counts.sort_by(|a, b| b.1.cmp(&a.1));
        let top_categories: Vec<String> =
            category_counts.into_iter().take(TOP_CATEGORY_COUNT).map(|(category, _)| category).collect();

        if top_categories.is_empty() {
            let products = self.catalog.top_rated(&[], limit).await?;
            return Ok(RecommendationSet::new(RecommendationKind::Personalized, products));
        }

        let candidates =
            self.catalog.find_in_categories(&top_categories, &interacted, limit * 2).await?;

        let mut scored: Vec<(f64, Product)> = candidates
            .into_iter()
            .map(|product| (affinity_score(&product, &top_categories, price_range), product))
            .collect();
        sort_by_score_desc(&mut scored);

        let mut products: Vec<Product> =
            scored.into_iter().take(limit).map(|(_, product)| product).collect();
        self.pad_with_top_rated(&mut products, limit, &interacted).await?;

        Ok(RecommendationSet::new(RecommendationKind::Personalized, products)
            .with_based_on(top_categories))
    }

    /// Products co-occurring with the base across past orders.
    ///
    /// The base product only seeds the ranking and the category padding, so
    /// an unknown id degrades to an empty set instead of failing.
    pub async fn frequently_bought(
        &self,
        product_id: &ProductId,
        limit: usize,
    ) -> RecResult<RecommendationSet> {
        let Some(base) = self.catalog.find_by_id(product_id).await? else {
            debug!(
                event_name = "recs.frequently_bought.unknown_base",
                product_id = %product_id,
                "base product does not resolve, returning empty set"
            );
            return Ok(RecommendationSet::new(
                RecommendationKind::FrequentlyBoughtTogether,
                Vec::new(),
            ));
        };

        let orders = self.orders.orders_containing(product_id).await?;

        let mut tallies: HashMap<ProductId, u32> = HashMap::new();
        for order in &orders {
            for line in &order.lines {
                if line.product_id != *product_id {
                    *tallies.entry(line.product_id.clone()).or_insert(0) += 1;
                }
            }
        }

        // Tally descending, then id, so equal tallies rank deterministically.
        let mut ranked: Vec<(ProductId, u32)> = tallies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let ids: Vec<ProductId> = ranked.into_iter().map(|(id, _)| id).collect();
        let mut products = self.resolve_preserving_order(&ids).await?;

        if products.len() < limit {
            let mut exclude: Vec<ProductId> =
                products.iter().map(|product| product.id.clone()).collect();
            exclude.push(product_id.clone());
            let fill = self
                .catalog
                .find_in_category(&base.category, &exclude, limit - products.len())
                .await?;
            products.extend(fill);
        }

        Ok(RecommendationSet::new(RecommendationKind::FrequentlyBoughtTogether, products))
    }

    /// Recency-weighted activity aggregation over the trailing window.
    pub async fn trending(&self, limit: usize) -> RecResult<RecommendationSet> {
        let since = Utc::now() - Duration::days(TRENDING_WINDOW_DAYS);
        let counts = self.activity.trend_counts(since).await?;

        let ids: Vec<ProductId> = counts.into_iter().take(limit).map(|(id, _)| id).collect();
        let mut products = self.resolve_preserving_order(&ids).await?;
        self.pad_with_top_rated(&mut products, limit, &[]).await?;

        Ok(RecommendationSet::new(RecommendationKind::Trending, products))
    }

    /// Guest-safe homepage mix: half top-rated, half newest, deduplicated
    /// preserving first-seen order.
    pub async fn for_you(&self, limit: usize) -> RecResult<RecommendationSet> {
        let half = limit.div_ceil(2);
        let (top_rated, newest) =
            tokio::join!(self.catalog.top_rated(&[], half), self.catalog.newest(half));

        let mut seen = HashSet::new();
        let mut products = Vec::new();
        for product in top_rated?.into_iter().chain(newest?) {
            if products.len() == limit {
                break;
            }
            if seen.insert(product.id.clone()) {
                products.push(product);
            }
        }

        Ok(RecommendationSet::new(RecommendationKind::ForYou, products))
    }

    /// Record one user-product interaction with a category/price snapshot.
    ///
    /// Purchases are recorded when an order is placed, never through this
    /// path. A failed append is logged and swallowed: tracking must not fail
    /// the user action that triggered it.
    pub async fn track(
        &self,
        user_id: UserId,
        product_id: &ProductId,
        activity_type: ActivityType,
    ) -> RecResult<()> {
        if activity_type == ActivityType::Purchase {
            return Err(DomainError::UntrackableActivity(activity_type).into());
        }

        let product = self
            .catalog
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| RecommendationError::ProductNotFound(product_id.clone()))?;

        let record = ActivityRecord::capture(user_id, &product, activity_type);
        if let Err(error) = self.activity.append(record).await {
            warn!(
                event_name = "recs.track.append_failed",
                product_id = %product_id,
                activity_type = %activity_type,
                error = %error,
                "activity append failed, interaction dropped"
            );
        }

        Ok(())
    }

    /// Batch-resolve ids and restore the caller's ranking; unresolved ids
    /// (deleted products) drop out.
    async fn resolve_preserving_order(&self, ids: &[ProductId]) -> RecResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut unique: Vec<ProductId> = Vec::new();
        for id in ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }

        let resolved = self.catalog.find_by_ids(&unique).await?;
        let by_id: HashMap<ProductId, Product> =
            resolved.into_iter().map(|product| (product.id.clone(), product)).collect();

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    /// Shared fallback: top up short results with globally top-rated
    /// products, never re-including present or excluded ids.
    async fn pad_with_top_rated(
        &self,
        products: &mut Vec<Product>,
        limit: usize,
        also_exclude: &[ProductId],
    ) -> RecResult<()> {
        if products.len() >= limit {
            return Ok(());
        }

        let mut exclude: Vec<ProductId> = products.iter().map(|product| product.id.clone()).collect();
        exclude.extend(also_exclude.iter().cloned());

        let fill = self.catalog.top_rated(&exclude, limit - products.len()).await?;
        products.extend(fill);
        Ok(())
    }
}

/// Personalized candidate score: category rank, price-range fit, rating, and
/// capped review-count popularity.
fn affinity_score(product: &Product, top_categories: &[String], price_range: Option<(f64, f64)>) -> f64 {
    let mut score = 0.0;

    if let Some(rank) = top_categories.iter().position(|category| *category == product.category) {
        score += (TOP_CATEGORY_COUNT - rank) as f64 * 10.0;
    }

    if let Some((min, max)) = price_range {
        if product.price >= min * 0.5 && product.price <= max * 1.5 {
            score += 20.0;
        }
    }

    score += product.rating * 5.0;
    score += (f64::from(product.num_reviews) / 10.0).min(20.0);

    score
}

fn sort_by_score_desc(scored: &mut [(f64, Product)]) {
    // Stable, so equal scores keep fetch order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::domain::activity::{ActivityRecord, ActivityType};
    use crate::domain::order::{Order, OrderId, OrderLine};
    use crate::domain::product::{Product, ProductId};
    use crate::domain::user::UserId;
    use crate::errors::RecommendationError;
    use crate::store::{ActivityLog, OrderLookup, ProductCatalog, StoreError, StoreResult};

    use super::Recommender;

    fn pid(id: &str) -> ProductId {
        ProductId(id.to_string())
    }

    fn uid(id: &str) -> UserId {
        UserId(id.to_string())
    }

    fn product(id: &str, category: &str, price: f64, rating: f64, num_reviews: u32) -> Product {
        Product {
            id: pid(id),
            name: format!("Product {id}"),
            description: String::new(),
            category: category.to_string(),
            price,
            image: String::new(),
            rating,
            num_reviews,
            stock: 10,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn product_created(mut base: Product, created_at: DateTime<Utc>) -> Product {
        base.created_at = created_at;
        base
    }

    fn activity(
        user: &str,
        product: &Product,
        activity_type: ActivityType,
        recorded_at: DateTime<Utc>,
    ) -> ActivityRecord {
        ActivityRecord {
            id: format!("act-{}-{}-{recorded_at}", user, product.id),
            user_id: uid(user),
            product_id: product.id.clone(),
            activity_type,
            category: product.category.clone(),
            price: product.price,
            recorded_at,
        }
    }

    fn order(id: &str, user: &str, product_ids: &[&str]) -> Order {
        Order {
            id: OrderId(id.to_string()),
            user_id: uid(user),
            lines: product_ids
                .iter()
                .map(|product_id| OrderLine {
                    product_id: pid(product_id),
                    quantity: 1,
                    unit_price: Decimal::new(999, 2),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct FixtureCatalog {
        products: Vec<Product>,
    }

    #[async_trait]
    impl ProductCatalog for FixtureCatalog {
        async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
            Ok(self.products.iter().find(|product| &product.id == id).cloned())
        }

        async fn find_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
            Ok(self
                .products
                .iter()
                .filter(|product| ids.contains(&product.id))
                .cloned()
                .collect())
        }

        async fn find_similar_candidates(
            &self,
            base: &Product,
            cap: usize,
        ) -> StoreResult<Vec<Product>> {
            Ok(self
                .products
                .iter()
                .filter(|candidate| {
                    candidate.id != base.id
                        && (candidate.category == base.category
                            || (candidate.price >= base.price * 0.5
                                && candidate.price <= base.price * 1.5))
                })
                .take(cap)
                .cloned()
                .collect())
        }

        async fn find_in_categories(
            &self,
            categories: &[String],
            exclude: &[ProductId],
            cap: usize,
        ) -> StoreResult<Vec<Product>> {
            let mut matches: Vec<Product> = self
                .products
                .iter()
                .filter(|product| {
                    categories.contains(&product.category) && !exclude.contains(&product.id)
                })
                .cloned()
                .collect();
            matches.sort_by(|a, b| {
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.num_reviews.cmp(&a.num_reviews))
            });
            matches.truncate(cap);
            Ok(matches)
        }

        async fn find_in_category(
            &self,
            category: &str,
            exclude: &[ProductId],
            cap: usize,
        ) -> StoreResult<Vec<Product>> {
            self.find_in_categories(&[category.to_string()], exclude, cap).await
        }

        async fn top_rated(&self, exclude: &[ProductId], cap: usize) -> StoreResult<Vec<Product>> {
            let mut matches: Vec<Product> = self
                .products
                .iter()
                .filter(|product| !exclude.contains(&product.id))
                .cloned()
                .collect();
            matches.sort_by(|a, b| {
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.num_reviews.cmp(&a.num_reviews))
            });
            matches.truncate(cap);
            Ok(matches)
        }

        async fn newest(&self, cap: usize) -> StoreResult<Vec<Product>> {
            let mut matches = self.products.clone();
            matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            matches.truncate(cap);
            Ok(matches)
        }
    }

    #[derive(Default)]
    struct FixtureOrders {
        orders: Vec<Order>,
    }

    #[async_trait]
    impl OrderLookup for FixtureOrders {
        async fn orders_containing(&self, product_id: &ProductId) -> StoreResult<Vec<Order>> {
            Ok(self.orders.iter().filter(|order| order.contains(product_id)).cloned().collect())
        }
    }

    #[derive(Default)]
    struct FixtureLog {
        records: Vec<ActivityRecord>,
        fail_appends: bool,
    }

    #[async_trait]
    impl ActivityLog for FixtureLog {
        async fn append(&self, _record: ActivityRecord) -> StoreResult<()> {
            if self.fail_appends {
                return Err(StoreError::Unavailable("append rejected".to_string()));
            }
            Ok(())
        }

        async fn recent_by_user_and_type(
            &self,
            user_id: &UserId,
            activity_type: ActivityType,
            limit: usize,
        ) -> StoreResult<Vec<ActivityRecord>> {
            let mut matches: Vec<ActivityRecord> = self
                .records
                .iter()
                .filter(|record| {
                    &record.user_id == user_id && record.activity_type == activity_type
                })
                .cloned()
                .collect();
            matches.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
            matches.truncate(limit);
            Ok(matches)
        }

        async fn all_by_user_and_type(
            &self,
            user_id: &UserId,
            activity_type: ActivityType,
        ) -> StoreResult<Vec<ActivityRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|record| {
                    &record.user_id == user_id && record.activity_type == activity_type
                })
                .cloned()
                .collect())
        }

        async fn trend_counts(&self, since: DateTime<Utc>) -> StoreResult<Vec<(ProductId, i64)>> {
            let mut counts: Vec<(ProductId, i64)> = Vec::new();
            for record in self.records.iter().filter(|record| record.recorded_at >= since) {
                let weight = match record.activity_type {
                    ActivityType::View => 1,
                    ActivityType::CartAdd => 2,
                    ActivityType::Purchase => 5,
                    ActivityType::Wishlist => 0,
                };
                match counts.iter_mut().find(|(id, _)| id == &record.product_id) {
                    Some((_, count)) => *count += weight,
                    None => counts.push((record.product_id.clone(), weight)),
                }
            }
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            Ok(counts)
        }
    }

    fn recommender(
        products: Vec<Product>,
        orders: Vec<Order>,
        records: Vec<ActivityRecord>,
    ) -> Recommender {
        Recommender::new(
            Arc::new(FixtureCatalog { products }),
            Arc::new(FixtureOrders { orders }),
            Arc::new(FixtureLog { records, fail_appends: false }),
        )
    }

    fn ids(set: &crate::recs::RecommendationSet) -> Vec<&str> {
        set.products.iter().map(|product| product.id.0.as_str()).collect()
    }

    #[tokio::test]
    async fn similar_unknown_base_is_not_found() {
        let engine = recommender(vec![], vec![], vec![]);
        let error = engine.similar(&pid("ghost"), 6).await.expect_err("missing base");
        assert!(matches!(error, RecommendationError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn similar_ranks_by_score_and_respects_limit() {
        let base = product("base", "Books", 1000.0, 4.0, 50);
        let close = product("close", "Books", 1100.0, 4.6, 80);
        let same_category = product("same-cat", "Books", 5000.0, 2.0, 5);
        let price_only = product("price-only", "Games", 1050.0, 4.0, 30);
        let engine = recommender(
            vec![base, close.clone(), same_category, price_only],
            vec![],
            vec![],
        );

        let set = engine.similar(&pid("base"), 2).await.expect("similar");

        assert_eq!(set.products.len(), 2);
        assert_eq!(set.products[0].id, close.id);
        assert!(!ids(&set).contains(&"base"));
    }

    #[tokio::test]
    async fn personalized_with_empty_history_is_the_top_rated_fallback() {
        let products = vec![
            product("a", "Books", 100.0, 4.9, 500),
            product("b", "Games", 200.0, 4.7, 300),
            product("c", "Books", 300.0, 4.5, 100),
        ];
        let engine = recommender(products, vec![], vec![]);

        let set = engine.personalized(&uid("fresh"), 2).await.expect("personalized");

        assert!(set.based_on.is_empty());
        assert_eq!(ids(&set), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn personalized_prefers_frequent_categories_and_excludes_interacted() {
        let viewed = product("viewed", "Books", 1000.0, 4.0, 50);
        let bought = product("bought", "Books", 1200.0, 4.2, 70);
        let other_view = product("other", "Games", 900.0, 3.9, 20);
        let book_pick = product("book-pick", "Books", 1100.0, 4.4, 90);
        let game_pick = product("game-pick", "Games", 950.0, 4.6, 60);
        let outlier = product("outlier", "Garden", 50.0, 5.0, 999);

        let now = Utc::now();
        let records = vec![
            activity("u", &viewed, ActivityType::View, now - Duration::hours(1)),
            activity("u", &other_view, ActivityType::View, now - Duration::hours(2)),
            activity("u", &bought, ActivityType::Purchase, now - Duration::days(3)),
        ];
        let engine = recommender(
            vec![viewed, bought, other_view, book_pick.clone(), game_pick.clone(), outlier],
            vec![],
            records,
        );

        let set = engine.personalized(&uid("u"), 2).await.expect("personalized");

        // Books counted twice, Games once.
        assert_eq!(set.based_on, vec!["Books".to_string(), "Games".to_string()]);
        assert!(!ids(&set).contains(&"viewed"));
        assert!(!ids(&set).contains(&"bought"));
        assert!(ids(&set).contains(&"book-pick"));
        assert_eq!(set.products.len(), 2);
    }

    #[tokio::test]
    async fn personalized_pads_to_limit_with_top_rated() {
        let viewed = product("viewed", "Books", 1000.0, 4.0, 50);
        let filler = product("filler", "Garden", 40.0, 4.9, 400);
        let now = Utc::now();
        let records = vec![activity("u", &viewed, ActivityType::View, now)];
        let engine = recommender(vec![viewed, filler.clone()], vec![], records);

        let set = engine.personalized(&uid("u"), 3).await.expect("personalized");

        // Only the filler remains once the single interacted product is out.
        assert_eq!(ids(&set), vec!["filler"]);
        assert_eq!(set.based_on, vec!["Books".to_string()]);
    }

    #[tokio::test]
    async fn personalized_counts_only_the_twenty_most_recent_views() {
        let now = Utc::now();
        let stale_a = product("stale-a", "Games", 900.0, 4.1, 40);
        let stale_b = product("stale-b", "Games", 950.0, 4.2, 45);
        let edge = product("edge", "Garden", 500.0, 4.3, 30);
        let book_pick = product("book-pick", "Books", 1100.0, 4.4, 90);

        // The stale Games views sit first in insertion order; only
        // recorded_at may decide which records survive the history cap.
        let mut records = vec![
            activity("u", &stale_a, ActivityType::View, now - Duration::days(10)),
            activity("u", &stale_b, ActivityType::View, now - Duration::days(10)),
        ];
        let mut products = vec![stale_a, stale_b, edge.clone(), book_pick.clone()];
        for i in 1..=19i64 {
            let viewed = product(&format!("hist-{i}"), "Books", 1000.0, 4.0, 50);
            records.push(activity("u", &viewed, ActivityType::View, now - Duration::minutes(i)));
            products.push(viewed);
        }
        // The twentieth-most-recent view just makes the cut.
        records.push(activity("u", &edge, ActivityType::View, now - Duration::minutes(20)));

        let engine = recommender(products, vec![], records);
        let set = engine.personalized(&uid("u"), 1).await.expect("personalized");

        // Books 19, Garden 1; the twenty-record window drops the Games views.
        assert_eq!(set.based_on, vec!["Books".to_string(), "Garden".to_string()]);
        assert_eq!(ids(&set), vec!["book-pick"]);
    }

    #[tokio::test]
    async fn frequently_bought_ranks_by_co_occurrence_count() {
        let base = product("base", "Books", 100.0, 4.0, 10);
        let q = product("q", "Games", 200.0, 4.0, 10);
        let r = product("r", "Garden", 300.0, 4.0, 10);
        let orders = vec![
            order("o1", "u1", &["base", "q", "r"]),
            order("o2", "u2", &["base", "r"]),
            order("o3", "u3", &["q", "r"]),
        ];
        let engine = recommender(vec![base, q, r], orders, vec![]);

        let set = engine.frequently_bought(&pid("base"), 2).await.expect("frequently bought");

        // r co-occurs twice, q once; o3 does not contain the base.
        assert_eq!(ids(&set), vec!["r", "q"]);
    }

    #[tokio::test]
    async fn frequently_bought_with_unknown_base_returns_empty() {
        let engine = recommender(vec![], vec![order("o1", "u1", &["ghost", "x"])], vec![]);

        let set = engine.frequently_bought(&pid("ghost"), 4).await.expect("degraded");

        assert!(set.products.is_empty());
    }

    #[tokio::test]
    async fn frequently_bought_pads_with_same_category() {
        let base = product("base", "Books", 100.0, 4.0, 10);
        let shelf_mate = product("shelf-mate", "Books", 150.0, 4.8, 90);
        let unrelated = product("unrelated", "Games", 150.0, 5.0, 900);
        let engine = recommender(vec![base, shelf_mate, unrelated], vec![], vec![]);

        let set = engine.frequently_bought(&pid("base"), 2).await.expect("frequently bought");

        // No order history, so padding comes from the base's category only.
        assert_eq!(ids(&set), vec!["shelf-mate"]);
    }

    #[tokio::test]
    async fn trending_weighs_purchases_over_views() {
        let viewed = product("viewed", "Books", 100.0, 3.0, 10);
        let purchased = product("purchased", "Games", 200.0, 3.0, 10);
        let now = Utc::now();
        let records = vec![
            activity("u1", &viewed, ActivityType::View, now - Duration::hours(1)),
            activity("u2", &viewed, ActivityType::View, now - Duration::hours(2)),
            activity("u3", &purchased, ActivityType::Purchase, now - Duration::hours(3)),
        ];
        let engine = recommender(vec![viewed, purchased], vec![], records);

        let set = engine.trending(2).await.expect("trending");

        // 5 purchase points beat 2 view points.
        assert_eq!(ids(&set), vec!["purchased", "viewed"]);
    }

    #[tokio::test]
    async fn trending_ignores_activity_outside_the_window_and_pads() {
        let stale = product("stale", "Books", 100.0, 3.0, 10);
        let top = product("top", "Games", 200.0, 4.9, 500);
        let records = vec![activity("u1", &stale, ActivityType::Purchase, Utc::now() - Duration::days(30))];
        let engine = recommender(vec![stale, top], vec![], records);

        let set = engine.trending(1).await.expect("trending");

        assert_eq!(ids(&set), vec!["top"]);
    }

    #[tokio::test]
    async fn for_you_mixes_top_rated_then_newest() {
        let now = Utc::now();
        let products = vec![
            product("top-1", "Books", 100.0, 4.9, 500),
            product("top-2", "Games", 200.0, 4.8, 400),
            product_created(product("new-1", "Garden", 300.0, 1.0, 1), now),
            product_created(product("new-2", "Garden", 400.0, 1.5, 2), now - Duration::hours(1)),
        ];
        let engine = recommender(products, vec![], vec![]);

        let set = engine.for_you(4).await.expect("for you");

        assert_eq!(ids(&set), vec!["top-1", "top-2", "new-1", "new-2"]);
    }

    #[tokio::test]
    async fn for_you_deduplicates_overlap_and_truncates() {
        let now = Utc::now();
        // Highest rated product is also the newest.
        let products = vec![
            product_created(product("star", "Books", 100.0, 5.0, 900), now),
            product("top-2", "Games", 200.0, 4.8, 400),
            product_created(product("new-2", "Garden", 400.0, 1.5, 2), now - Duration::hours(1)),
        ];
        let engine = recommender(products, vec![], vec![]);

        let set = engine.for_you(4).await.expect("for you");

        assert_eq!(ids(&set), vec!["star", "top-2", "new-2"]);
    }

    #[tokio::test]
    async fn track_rejects_direct_purchase_records() {
        let item = product("item", "Books", 100.0, 4.0, 10);
        let engine = recommender(vec![item], vec![], vec![]);

        let error = engine
            .track(uid("u"), &pid("item"), ActivityType::Purchase)
            .await
            .expect_err("purchase is not trackable");

        assert!(matches!(
            error,
            RecommendationError::Domain(crate::errors::DomainError::UntrackableActivity(_))
        ));
    }

    #[tokio::test]
    async fn track_requires_an_existing_product() {
        let engine = recommender(vec![], vec![], vec![]);

        let error = engine
            .track(uid("u"), &pid("ghost"), ActivityType::View)
            .await
            .expect_err("unknown product");

        assert!(matches!(error, RecommendationError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn track_swallows_append_failures() {
        let item = product("item", "Books", 100.0, 4.0, 10);
        let engine = Recommender::new(
            Arc::new(FixtureCatalog { products: vec![item] }),
            Arc::new(FixtureOrders::default()),
            Arc::new(FixtureLog { records: vec![], fail_appends: true }),
        );

        engine
            .track(uid("u"), &pid("item"), ActivityType::View)
            .await
            .expect("append failure must not surface");
    }

    #[tokio::test]
    async fn results_never_exceed_the_requested_limit() {
        let products: Vec<Product> = (0..10)
            .map(|index| product(&format!("p{index}"), "Books", 100.0, 4.0, 10))
            .collect();
        let engine = recommender(products, vec![], vec![]);

        assert!(engine.for_you(3).await.expect("for you").products.len() <= 3);
        assert!(engine.trending(3).await.expect("trending").products.len() <= 3);
        assert!(engine.personalized(&uid("u"), 3).await.expect("personalized").products.len() <= 3);
        assert!(engine.similar(&pid("p0"), 3).await.expect("similar").products.len() <= 3);
    }
}
