use sqlx::Row;

use coffeebot_core::domain::user::UserId;

use super::{decode_error, RepositoryError, TestUserRepository};
use crate::DbPool;

pub struct SqlTestUserRepository {
    pool: DbPool,
}

impl SqlTestUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TestUserRepository for SqlTestUserRepository {
    async fn save(&self, user_name: &str, user_id: &UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO test_user (user_name, user_id) VALUES (?, ?)
             ON CONFLICT(user_name) DO UPDATE SET user_id = excluded.user_id",
        )
        .bind(user_name)
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user_id(&self, user_name: &str) -> Result<Option<UserId>, RepositoryError> {
        let row = sqlx::query("SELECT user_id FROM test_user WHERE user_name = ?")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get::<String, _>("user_id").map(UserId).map_err(decode_error))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use coffeebot_core::domain::user::UserId;

    use super::SqlTestUserRepository;
    use crate::repositories::test_support::setup;
    use crate::repositories::TestUserRepository;

    #[tokio::test]
    async fn saved_user_resolves_by_name() {
        let repo = SqlTestUserRepository::new(setup().await);

        repo.save("bobby", &UserId::new("U1")).await.expect("save");
        repo.save("bobby", &UserId::new("U2")).await.expect("overwrite");

        assert_eq!(repo.find_user_id("bobby").await.expect("find"), Some(UserId::new("U2")));
        assert_eq!(repo.find_user_id("alice").await.expect("find missing"), None);
    }
}
