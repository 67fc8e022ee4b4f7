use chrono::NaiveDate;
use sqlx::Row;

use coffeebot_core::domain::order::{NewOrder, Order, OrderId, UserOrderResponse};
use coffeebot_core::domain::user::UserId;
use coffeebot_core::parse::canonical_date;
use coffeebot_core::ORDER_DATE_FORMAT;

use super::{decode_error, parse_timestamp, OrderRepository, RepositoryError};
use crate::DbPool;

const ORDER_COLUMNS: &str = r#"SELECT id, date, thread_id, channel_id, coffee_getter FROM "order""#;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let date: String = row.try_get("date").map_err(decode_error)?;
    let thread_id: Option<String> = row.try_get("thread_id").map_err(decode_error)?;
    let channel_id: Option<String> = row.try_get("channel_id").map_err(decode_error)?;
    let coffee_getter: String = row.try_get("coffee_getter").map_err(decode_error)?;

    Ok(Order {
        id: OrderId(id),
        date: parse_timestamp("date", &date)?,
        thread_id,
        channel_id,
        coffee_getter: UserId(coffee_getter),
    })
}

fn row_to_response(row: &sqlx::sqlite::SqliteRow) -> Result<UserOrderResponse, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let order_id: i64 = row.try_get("order_id").map_err(decode_error)?;
    let response: i64 = row.try_get("response").map_err(decode_error)?;

    Ok(UserOrderResponse {
        id,
        user_id: UserId(user_id),
        order_id: OrderId(order_id),
        wants_coffee: response != 0,
    })
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query(
            r#"INSERT INTO "order" (date, thread_id, channel_id, coffee_getter)
               VALUES (?, ?, ?, ?)
               RETURNING id, date, thread_id, channel_id, coffee_getter"#,
        )
        .bind(order.date.format(ORDER_DATE_FORMAT).to_string())
        .bind(&order.thread_id)
        .bind(&order.channel_id)
        .bind(order.coffee_getter.as_str())
        .fetch_one(&self.pool)
        .await?;

        row_to_order(&row)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("{ORDER_COLUMNS} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn find_by_thread_id(&self, thread_id: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{ORDER_COLUMNS} WHERE thread_id = ? ORDER BY id DESC LIMIT 1"
        ))
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{ORDER_COLUMNS} WHERE substr(date, 1, 10) = ? ORDER BY date DESC, id DESC LIMIT 1"
        ))
        .bind(canonical_date(date))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn most_recent(&self) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("{ORDER_COLUMNS} ORDER BY date DESC, id DESC LIMIT 1"))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_history(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!("{ORDER_COLUMNS} ORDER BY date DESC, id DESC LIMIT ?"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn list_by_getter(
        &self,
        coffee_getter: &UserId,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{ORDER_COLUMNS} WHERE coffee_getter = ? ORDER BY date DESC, id DESC LIMIT ?"
        ))
        .bind(coffee_getter.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn record_response(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        wants_coffee: bool,
    ) -> Result<UserOrderResponse, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO user_order (user_id, order_id, response)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id, order_id) DO UPDATE SET response = excluded.response
             RETURNING id, user_id, order_id, response",
        )
        .bind(user_id.as_str())
        .bind(order_id.0)
        .bind(i64::from(wants_coffee))
        .fetch_one(&self.pool)
        .await?;

        row_to_response(&row)
    }

    async fn find_response(
        &self,
        order_id: OrderId,
        user_id: &UserId,
    ) -> Result<Option<UserOrderResponse>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, order_id, response
             FROM user_order
             WHERE order_id = ? AND user_id = ?",
        )
        .bind(order_id.0)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_response).transpose()
    }

    async fn responses_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<UserOrderResponse>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, order_id, response
             FROM user_order
             WHERE order_id = ?
             ORDER BY id ASC",
        )
        .bind(order_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_response).collect()
    }
}
