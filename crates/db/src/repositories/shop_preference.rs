use sqlx::Row;

use coffeebot_core::domain::preference::{LocationMatch, NewShopPreference, ShopPreference};
use coffeebot_core::domain::user::UserId;

use super::{decode_error, parse_timestamp, RepositoryError, ShopPreferenceRepository};
use crate::DbPool;

pub struct SqlShopPreferenceRepository {
    pool: DbPool,
}

impl SqlShopPreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_shop(row: &sqlx::sqlite::SqliteRow) -> Result<ShopPreference, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let name: String = row.try_get("name").map_err(decode_error)?;
    let location: Option<String> = row.try_get("location").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    Ok(ShopPreference {
        id,
        user_id: UserId(user_id),
        name,
        location,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl ShopPreferenceRepository for SqlShopPreferenceRepository {
    async fn save(
        &self,
        user_id: &UserId,
        shop: NewShopPreference,
    ) -> Result<ShopPreference, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO shop_preference (user_id, name, location)
             VALUES (?, ?, ?)
             RETURNING id, user_id, name, location, created_at",
        )
        .bind(user_id.as_str())
        .bind(&shop.name)
        .bind(&shop.location)
        .fetch_one(&self.pool)
        .await?;

        row_to_shop(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShopPreference>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, name, location, created_at FROM shop_preference WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_shop).transpose()
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ShopPreference>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, name, location, created_at
             FROM shop_preference
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_shop).transpose()
    }

    async fn list_all(&self) -> Result<Vec<ShopPreference>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, location, created_at
             FROM shop_preference
             ORDER BY user_id ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_shop).collect()
    }

    async fn delete_matching(
        &self,
        user_id: &UserId,
        name: &str,
        location: &LocationMatch,
    ) -> Result<u64, RepositoryError> {
        let result = match location {
            LocationMatch::Missing => {
                sqlx::query(
                    "DELETE FROM shop_preference
                     WHERE user_id = ? AND name = ? AND location IS NULL",
                )
                .bind(user_id.as_str())
                .bind(name)
                .execute(&self.pool)
                .await?
            }
            LocationMatch::Exactly(location) => {
                sqlx::query(
                    "DELETE FROM shop_preference
                     WHERE user_id = ? AND name = ? AND location = ?",
                )
                .bind(user_id.as_str())
                .bind(name)
                .bind(location)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use coffeebot_core::domain::preference::{LocationMatch, NewShopPreference};
    use coffeebot_core::domain::user::UserId;

    use super::SqlShopPreferenceRepository;
    use crate::repositories::test_support::setup;
    use crate::repositories::ShopPreferenceRepository;

    fn shop(name: &str, location: Option<&str>) -> NewShopPreference {
        NewShopPreference { name: name.to_owned(), location: location.map(str::to_owned) }
    }

    #[tokio::test]
    async fn saved_shop_reads_back_by_id_and_user() {
        let repo = SqlShopPreferenceRepository::new(setup().await);
        let user = UserId::new("U1");

        let saved = repo.save(&user, shop("second cup", Some("213 sesame st"))).await.expect("save");

        assert_eq!(repo.find_by_id(saved.id).await.expect("find"), Some(saved.clone()));
        assert_eq!(repo.latest_for_user(&user).await.expect("latest"), Some(saved));
        assert_eq!(repo.find_by_id(9_999).await.expect("find missing"), None);
    }

    #[tokio::test]
    async fn delete_removes_only_matching_rows() {
        let repo = SqlShopPreferenceRepository::new(setup().await);
        let user = UserId::new("U1");

        repo.save(&user, shop("starbux", Some("library"))).await.expect("save");
        repo.save(&user, shop("starbux", Some("library"))).await.expect("save duplicate");
        repo.save(&user, shop("starbux", Some("campus"))).await.expect("save other location");
        repo.save(&UserId::new("U2"), shop("starbux", Some("library"))).await.expect("other user");

        let deleted = repo
            .delete_matching(&user, "starbux", &LocationMatch::Exactly("library".to_owned()))
            .await
            .expect("delete");
        assert_eq!(deleted, 2);

        let remaining = repo.list_all().await.expect("list");
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|shop| shop.location.as_deref() == Some("campus")));
        assert!(remaining.iter().any(|shop| shop.user_id == UserId::new("U2")));
    }

    #[tokio::test]
    async fn null_location_deletes_rows_without_location() {
        let repo = SqlShopPreferenceRepository::new(setup().await);
        let user = UserId::new("U1");

        repo.save(&user, shop("tims", None)).await.expect("save");
        repo.save(&user, shop("tims", Some("gordon st"))).await.expect("save with location");

        let deleted = repo
            .delete_matching(&user, "tims", &LocationMatch::from_input(Some("null")))
            .await
            .expect("delete");
        assert_eq!(deleted, 1);

        let remaining = repo.list_all().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].location.as_deref(), Some("gordon st"));
    }

    #[tokio::test]
    async fn delete_without_match_reports_zero() {
        let repo = SqlShopPreferenceRepository::new(setup().await);
        let deleted = repo
            .delete_matching(&UserId::new("U1"), "nowhere", &LocationMatch::Missing)
            .await
            .expect("delete");
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn list_is_sorted_by_user_id() {
        let repo = SqlShopPreferenceRepository::new(setup().await);

        repo.save(&UserId::new("U3"), shop("c", None)).await.expect("save");
        repo.save(&UserId::new("U1"), shop("a", None)).await.expect("save");
        repo.save(&UserId::new("U2"), shop("b", None)).await.expect("save");
        repo.save(&UserId::new("U1"), shop("a2", None)).await.expect("save");

        let users: Vec<_> = repo
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|shop| (shop.user_id.0, shop.name))
            .collect();
        assert_eq!(
            users,
            vec![
                ("U1".to_owned(), "a".to_owned()),
                ("U1".to_owned(), "a2".to_owned()),
                ("U2".to_owned(), "b".to_owned()),
                ("U3".to_owned(), "c".to_owned()),
            ]
        );
    }
}
