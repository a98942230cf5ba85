use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use storefront_core::domain::activity::{ActivityRecord, ActivityType};
use storefront_core::domain::product::ProductId;
use storefront_core::domain::user::UserId;
use storefront_core::store::{ActivityLog, StoreResult};

use crate::repositories::product::parse_timestamp;
use crate::repositories::{db_error, decode_error};
use crate::DbPool;

const ACTIVITY_COLUMNS: &str =
    "id, user_id, product_id, activity_type, category, price, recorded_at";

/// SQLite-backed append-only activity log.
///
/// Timestamps are stored as RFC 3339 UTC text, so lexicographic comparison in
/// SQL matches chronological order.
pub struct SqlActivityLog {
    pool: DbPool,
}

impl SqlActivityLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for SqlActivityLog {
    async fn append(&self, record: ActivityRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_activity
                 (id, user_id, product_id, activity_type, category, price, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.id)
        .bind(&record.user_id.0)
        .bind(&record.product_id.0)
        .bind(record.activity_type.as_str())
        .bind(&record.category)
        .bind(record.price)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn recent_by_user_and_type(
        &self,
        user_id: &UserId,
        activity_type: ActivityType,
        limit: usize,
    ) -> StoreResult<Vec<ActivityRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM user_activity
             WHERE user_id = ?1 AND activity_type = ?2
             ORDER BY recorded_at DESC
             LIMIT ?3",
        ))
        .bind(&user_id.0)
        .bind(activity_type.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn all_by_user_and_type(
        &self,
        user_id: &UserId,
        activity_type: ActivityType,
    ) -> StoreResult<Vec<ActivityRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM user_activity
             WHERE user_id = ?1 AND activity_type = ?2
             ORDER BY recorded_at DESC",
        ))
        .bind(&user_id.0)
        .bind(activity_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn trend_counts(&self, since: DateTime<Utc>) -> StoreResult<Vec<(ProductId, i64)>> {
        let rows = sqlx::query(
            "SELECT product_id,
                    SUM(CASE activity_type
                            WHEN 'view' THEN 1
                            WHEN 'cart_add' THEN 2
                            WHEN 'purchase' THEN 5
                            ELSE 0
                        END) AS score
             FROM user_activity
             WHERE recorded_at >= ?1
             GROUP BY product_id
             ORDER BY score DESC, product_id ASC",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                Ok((
                    ProductId(row.try_get("product_id").map_err(db_error)?),
                    row.try_get("score").map_err(db_error)?,
                ))
            })
            .collect()
    }
}

fn row_to_record(row: &SqliteRow) -> StoreResult<ActivityRecord> {
    let type_raw: String = row.try_get("activity_type").map_err(db_error)?;
    let activity_type = ActivityType::from_str(&type_raw)
        .map_err(|error| decode_error(error.to_string()))?;

    Ok(ActivityRecord {
        id: row.try_get("id").map_err(db_error)?,
        user_id: UserId(row.try_get("user_id").map_err(db_error)?),
        product_id: ProductId(row.try_get("product_id").map_err(db_error)?),
        activity_type,
        category: row.try_get("category").map_err(db_error)?,
        price: row.try_get("price").map_err(db_error)?,
        recorded_at: parse_timestamp(row, "recorded_at")?,
    })
}
