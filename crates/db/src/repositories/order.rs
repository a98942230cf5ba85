use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use storefront_core::domain::order::{Order, OrderId, OrderLine};
use storefront_core::domain::product::ProductId;
use storefront_core::domain::user::UserId;
use storefront_core::store::{OrderLookup, StoreResult};

use crate::repositories::product::parse_timestamp;
use crate::repositories::{db_error, decode_error};
use crate::DbPool;

/// SQLite-backed order lookup for the co-occurrence engine.
pub struct SqlOrderLookup {
    pool: DbPool,
}

impl SqlOrderLookup {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLookup for SqlOrderLookup {
    async fn orders_containing(&self, product_id: &ProductId) -> StoreResult<Vec<Order>> {
        // One pass over all lines of every qualifying order, grouped in Rust.
        let rows = sqlx::query(
            "SELECT o.id AS order_id, o.user_id, o.created_at,
                    l.product_id, l.quantity, l.unit_price
             FROM store_order o
             JOIN order_line l ON l.order_id = o.id
             WHERE o.id IN (SELECT order_id FROM order_line WHERE product_id = ?1)
             ORDER BY o.id, l.product_id",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut orders: Vec<Order> = Vec::new();
        for row in &rows {
            let order_id: String = row.try_get("order_id").map_err(db_error)?;
            let quantity: i64 = row.try_get("quantity").map_err(db_error)?;
            let unit_price_raw: String = row.try_get("unit_price").map_err(db_error)?;

            let line = OrderLine {
                product_id: ProductId(row.try_get("product_id").map_err(db_error)?),
                quantity: u32::try_from(quantity)
                    .map_err(|_| decode_error(format!("quantity `{quantity}` out of range")))?,
                unit_price: Decimal::from_str(&unit_price_raw).map_err(|error| {
                    decode_error(format!("invalid unit_price `{unit_price_raw}`: {error}"))
                })?,
            };

            match orders.last_mut() {
                Some(order) if order.id.0 == order_id => order.lines.push(line),
                _ => orders.push(Order {
                    id: OrderId(order_id),
                    user_id: UserId(row.try_get("user_id").map_err(db_error)?),
                    lines: vec![line],
                    created_at: parse_timestamp(row, "created_at")?,
                }),
            }
        }

        Ok(orders)
    }
}
