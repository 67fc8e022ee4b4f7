use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use coffeebot_core::domain::order::{NewOrder, Order, OrderId, UserOrderResponse};
use coffeebot_core::domain::preference::{
    DrinkPreference, LocationMatch, NewDrinkPreference, NewShopPreference, ShopPreference,
};
use coffeebot_core::domain::user::UserId;
use coffeebot_core::ORDER_DATE_FORMAT;

pub mod drink_preference;
pub mod memory;
pub mod order;
pub mod shop_preference;
pub mod test_user;

pub use drink_preference::SqlDrinkPreferenceRepository;
pub use memory::{
    InMemoryDrinkPreferenceRepository, InMemoryOrderRepository, InMemoryShopPreferenceRepository,
    InMemoryTestUserRepository,
};
pub use order::SqlOrderRepository;
pub use shop_preference::SqlShopPreferenceRepository;
pub use test_user::SqlTestUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Drink preferences accumulate; the newest row is the active one.
#[async_trait]
pub trait DrinkPreferenceRepository: Send + Sync {
    async fn save(
        &self,
        user_id: &UserId,
        drink: NewDrinkPreference,
    ) -> Result<DrinkPreference, RepositoryError>;

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DrinkPreference>, RepositoryError>;
}

#[async_trait]
pub trait ShopPreferenceRepository: Send + Sync {
    async fn save(
        &self,
        user_id: &UserId,
        shop: NewShopPreference,
    ) -> Result<ShopPreference, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<ShopPreference>, RepositoryError>;

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ShopPreference>, RepositoryError>;

    /// Every saved shop, ordered by user id and then by insertion.
    async fn list_all(&self) -> Result<Vec<ShopPreference>, RepositoryError>;

    /// Deletes the user's rows with this name and location, returning how many went.
    async fn delete_matching(
        &self,
        user_id: &UserId,
        name: &str,
        location: &LocationMatch,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_thread_id(&self, thread_id: &str) -> Result<Option<Order>, RepositoryError>;

    /// Latest order placed on the given calendar day.
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Order>, RepositoryError>;

    async fn most_recent(&self) -> Result<Option<Order>, RepositoryError>;

    /// Newest first.
    async fn list_history(&self, limit: u32) -> Result<Vec<Order>, RepositoryError>;

    async fn list_by_getter(
        &self,
        coffee_getter: &UserId,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Inserts the user's answer, or replaces the answer they already gave.
    async fn record_response(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        wants_coffee: bool,
    ) -> Result<UserOrderResponse, RepositoryError>;

    async fn find_response(
        &self,
        order_id: OrderId,
        user_id: &UserId,
    ) -> Result<Option<UserOrderResponse>, RepositoryError>;

    async fn responses_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<UserOrderResponse>, RepositoryError>;
}

/// Username directory used when Slack cannot resolve a name.
#[async_trait]
pub trait TestUserRepository: Send + Sync {
    async fn save(&self, user_name: &str, user_id: &UserId) -> Result<(), RepositoryError>;
    async fn find_user_id(&self, user_name: &str) -> Result<Option<UserId>, RepositoryError>;
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<NaiveDateTime, RepositoryError> {
    NaiveDateTime::parse_from_str(value, ORDER_DATE_FORMAT).map_err(|error| {
        RepositoryError::Decode(format!("invalid {column} timestamp `{value}`: {error}"))
    })
}

pub(crate) fn decode_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
