use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_PRODUCT_IDS: &[&str] = &[
    "prod-headphones-001",
    "prod-mixer-001",
    "prod-speaker-001",
    "prod-parka-001",
    "prod-jacket-001",
    "prod-blazer-001",
    "prod-book-startup-001",
    "prod-book-scars-001",
    "prod-book-coffee-001",
    "prod-book-autumn-001",
    "prod-table-001",
    "prod-clock-001",
];

const SEED_ORDER_IDS: &[&str] = &["order-0001", "order-0002", "order-0003", "order-0004"];

const SEED_ORDER_LINE_COUNT: i64 = 9;

const SEED_ACTIVITY_COUNT: i64 = 7;

/// Deterministic demo dataset for local development and integration tests.
///
/// Catalog rows carry fixed timestamps; activity rows are stamped relative to
/// load time so the trending window always covers the recent ones.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    /// Number of products already in the catalog, seeded or otherwise.
    pub async fn existing_product_count(pool: &DbPool) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM product").fetch_one(pool).await?)
    }

    /// Load the demo dataset in one transaction.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            products_seeded: SEED_PRODUCT_IDS.len(),
            orders_seeded: SEED_ORDER_IDS.len(),
            activity_seeded: SEED_ACTIVITY_COUNT as usize,
        })
    }

    /// Verify the loaded rows against the seed contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let product_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM product WHERE id IN ({})",
            sql_array_from_ids(SEED_PRODUCT_IDS),
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("seed products present", product_count == SEED_PRODUCT_IDS.len() as i64));

        let order_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM store_order WHERE id IN ({})",
            sql_array_from_ids(SEED_ORDER_IDS),
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("seed orders present", order_count == SEED_ORDER_IDS.len() as i64));

        let line_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM order_line WHERE order_id IN ({})",
            sql_array_from_ids(SEED_ORDER_IDS),
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("seed order lines present", line_count == SEED_ORDER_LINE_COUNT));

        let activity_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_activity WHERE id LIKE 'act-%'")
                .fetch_one(pool)
                .await?;
        checks.push(("seed activity present", activity_count == SEED_ACTIVITY_COUNT));

        let orphan_lines: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_line
             WHERE product_id NOT IN (SELECT id FROM product)",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("order lines resolve to products", orphan_lines == 0));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove every seeded row, newest dependency first.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_activity WHERE id LIKE 'act-%'")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "DELETE FROM order_line WHERE order_id IN ({})",
            sql_array_from_ids(SEED_ORDER_IDS),
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "DELETE FROM store_order WHERE id IN ({})",
            sql_array_from_ids(SEED_ORDER_IDS),
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "DELETE FROM product WHERE id IN ({})",
            sql_array_from_ids(SEED_PRODUCT_IDS),
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub orders_seeded: usize,
    pub activity_seeded: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(", ")
}
