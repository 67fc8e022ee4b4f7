use crate::{DbPool, RepositoryError};

/// Tables emptied by [`clear_all`], in deletion order.
pub const CLEARED_TABLES: [&str; 5] =
    ["drink_preference", "shop_preference", "user_order", "\"order\"", "test_user"];

/// Deletes every row from the coffee tables in one transaction.
///
/// Returns the total number of rows removed.
pub async fn clear_all(pool: &DbPool) -> Result<u64, RepositoryError> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;

    for table in CLEARED_TABLES {
        let result = sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        deleted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(deleted)
}
