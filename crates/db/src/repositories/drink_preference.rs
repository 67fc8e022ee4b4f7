use sqlx::Row;

use coffeebot_core::domain::preference::{DrinkPreference, NewDrinkPreference};
use coffeebot_core::domain::user::UserId;

use super::{decode_error, parse_timestamp, DrinkPreferenceRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDrinkPreferenceRepository {
    pool: DbPool,
}

impl SqlDrinkPreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_drink(row: &sqlx::sqlite::SqliteRow) -> Result<DrinkPreference, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let size: String = row.try_get("size").map_err(decode_error)?;
    let drink_type: String = row.try_get("type").map_err(decode_error)?;
    let details: String = row.try_get("details").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    Ok(DrinkPreference {
        id,
        user_id: UserId(user_id),
        size,
        drink_type,
        details,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl DrinkPreferenceRepository for SqlDrinkPreferenceRepository {
    async fn save(
        &self,
        user_id: &UserId,
        drink: NewDrinkPreference,
    ) -> Result<DrinkPreference, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO drink_preference (user_id, size, type, details)
             VALUES (?, ?, ?, ?)
             RETURNING id, user_id, size, type, details, created_at",
        )
        .bind(user_id.as_str())
        .bind(&drink.size)
        .bind(&drink.drink_type)
        .bind(&drink.details)
        .fetch_one(&self.pool)
        .await?;

        row_to_drink(&row)
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DrinkPreference>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, size, type, details, created_at
             FROM drink_preference
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_drink).transpose()
    }
}
