use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use storefront_core::domain::product::{Product, ProductId};
use storefront_core::store::{ProductCatalog, StoreResult};

use crate::repositories::{db_error, decode_error};
use crate::DbPool;

const PRODUCT_COLUMNS: &str =
    "id, name, description, category, price, image, rating, num_reviews, stock, created_at";

/// SQLite-backed product catalog.
///
/// Ranking queries lean on the category and rating indexes; dynamic id lists
/// go through `QueryBuilder` so every id stays a bound parameter.
pub struct SqlProductCatalog {
    pool: DbPool,
}

impl SqlProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for SqlProductCatalog {
    async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(&id.0);
        }
        builder.push(")");

        let rows = builder.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_product).collect()
    }

    async fn find_similar_candidates(
        &self,
        base: &Product,
        cap: usize,
    ) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE id <> ?1 AND (category = ?2 OR (price >= ?3 AND price <= ?4))
             LIMIT ?5",
        ))
        .bind(&base.id.0)
        .bind(&base.category)
        .bind(base.price * 0.5)
        .bind(base.price * 1.5)
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn find_in_categories(
        &self,
        categories: &[String],
        exclude: &[ProductId],
        cap: usize,
    ) -> StoreResult<Vec<Product>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE category IN ("));
        let mut separated = builder.separated(", ");
        for category in categories {
            separated.push_bind(category);
        }
        builder.push(")");
        push_exclusion(&mut builder, exclude);
        builder.push(" ORDER BY rating DESC, num_reviews DESC LIMIT ");
        builder.push_bind(cap as i64);

        let rows = builder.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_product).collect()
    }

    async fn find_in_category(
        &self,
        category: &str,
        exclude: &[ProductId],
        cap: usize,
    ) -> StoreResult<Vec<Product>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE category = "));
        builder.push_bind(category);
        push_exclusion(&mut builder, exclude);
        builder.push(" ORDER BY rating DESC, num_reviews DESC LIMIT ");
        builder.push_bind(cap as i64);

        let rows = builder.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_product).collect()
    }

    async fn top_rated(&self, exclude: &[ProductId], cap: usize) -> StoreResult<Vec<Product>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE 1 = 1"));
        push_exclusion(&mut builder, exclude);
        builder.push(" ORDER BY rating DESC, num_reviews DESC LIMIT ");
        builder.push_bind(cap as i64);

        let rows = builder.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_product).collect()
    }

    async fn newest(&self, cap: usize) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created_at DESC LIMIT ?1",
        ))
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_product).collect()
    }
}

fn push_exclusion(builder: &mut QueryBuilder<'_, Sqlite>, exclude: &[ProductId]) {
    if exclude.is_empty() {
        return;
    }
    builder.push(" AND id NOT IN (");
    let mut separated = builder.separated(", ");
    for id in exclude {
        separated.push_bind(id.0.clone());
    }
    builder.push(")");
}

pub(crate) fn row_to_product(row: &SqliteRow) -> StoreResult<Product> {
    let created_at = parse_timestamp(row, "created_at")?;
    let num_reviews: i64 = row.try_get("num_reviews").map_err(db_error)?;
    let stock: i64 = row.try_get("stock").map_err(db_error)?;

    Ok(Product {
        id: ProductId(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        category: row.try_get("category").map_err(db_error)?,
        price: row.try_get("price").map_err(db_error)?,
        image: row.try_get("image").map_err(db_error)?,
        rating: row.try_get("rating").map_err(db_error)?,
        num_reviews: u32::try_from(num_reviews)
            .map_err(|_| decode_error(format!("num_reviews `{num_reviews}` out of range")))?,
        stock: u32::try_from(stock)
            .map_err(|_| decode_error(format!("stock `{stock}` out of range")))?,
        created_at,
    })
}

pub(crate) fn parse_timestamp(row: &SqliteRow, column: &str) -> StoreResult<DateTime<Utc>> {
    let raw: String = row.try_get(column).map_err(db_error)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| decode_error(format!("invalid {column} `{raw}`: {error}")))
}
