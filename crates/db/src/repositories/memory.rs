use std::collections::HashMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;

use coffeebot_core::domain::order::{NewOrder, Order, OrderId, UserOrderResponse};
use coffeebot_core::domain::preference::{
    DrinkPreference, LocationMatch, NewDrinkPreference, NewShopPreference, ShopPreference,
};
use coffeebot_core::domain::user::UserId;

use super::{
    DrinkPreferenceRepository, OrderRepository, RepositoryError, ShopPreferenceRepository,
    TestUserRepository,
};

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Default)]
pub struct InMemoryDrinkPreferenceRepository {
    rows: RwLock<Vec<DrinkPreference>>,
}

#[async_trait::async_trait]
impl DrinkPreferenceRepository for InMemoryDrinkPreferenceRepository {
    async fn save(
        &self,
        user_id: &UserId,
        drink: NewDrinkPreference,
    ) -> Result<DrinkPreference, RepositoryError> {
        let mut rows = self.rows.write().await;
        let saved = DrinkPreference {
            id: rows.len() as i64 + 1,
            user_id: user_id.clone(),
            size: drink.size,
            drink_type: drink.drink_type,
            details: drink.details,
            created_at: now(),
        };
        rows.push(saved.clone());
        Ok(saved)
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DrinkPreference>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| &row.user_id == user_id)
            .max_by_key(|row| (row.created_at, row.id))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryShopPreferenceRepository {
    state: RwLock<ShopState>,
}

#[derive(Default)]
struct ShopState {
    next_id: i64,
    rows: Vec<ShopPreference>,
}

#[async_trait::async_trait]
impl ShopPreferenceRepository for InMemoryShopPreferenceRepository {
    async fn save(
        &self,
        user_id: &UserId,
        shop: NewShopPreference,
    ) -> Result<ShopPreference, RepositoryError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let saved = ShopPreference {
            id: state.next_id,
            user_id: user_id.clone(),
            name: shop.name,
            location: shop.location,
            created_at: now(),
        };
        state.rows.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShopPreference>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ShopPreference>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .filter(|row| &row.user_id == user_id)
            .max_by_key(|row| (row.created_at, row.id))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<ShopPreference>, RepositoryError> {
        let state = self.state.read().await;
        let mut rows = state.rows.clone();
        rows.sort_by(|left, right| {
            left.user_id.cmp(&right.user_id).then_with(|| left.id.cmp(&right.id))
        });
        Ok(rows)
    }

    async fn delete_matching(
        &self,
        user_id: &UserId,
        name: &str,
        location: &LocationMatch,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state.rows.retain(|row| {
            let matched = &row.user_id == user_id
                && row.name == name
                && location.matches(row.location.as_deref());
            !matched
        });
        Ok((before - state.rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: RwLock<OrderState>,
}

#[derive(Default)]
struct OrderState {
    orders: Vec<Order>,
    responses: Vec<UserOrderResponse>,
}

impl OrderState {
    fn newest_first(&self) -> Vec<Order> {
        let mut orders = self.orders.clone();
        orders.sort_by(|left, right| right.date.cmp(&left.date).then(right.id.0.cmp(&left.id.0)));
        orders
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;
        let created = Order {
            id: OrderId(state.orders.len() as i64 + 1),
            date: order.date,
            thread_id: order.thread_id,
            channel_id: order.channel_id,
            coffee_getter: order.coffee_getter,
        };
        state.orders.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|order| order.id == id).cloned())
    }

    async fn find_by_thread_id(&self, thread_id: &str) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .find(|order| order.thread_id.as_deref() == Some(thread_id))
            .cloned())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.newest_first().into_iter().find(|order| order.date.date() == date))
    }

    async fn most_recent(&self) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.newest_first().into_iter().next())
    }

    async fn list_history(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.newest_first().into_iter().take(limit as usize).collect())
    }

    async fn list_by_getter(
        &self,
        coffee_getter: &UserId,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .newest_first()
            .into_iter()
            .filter(|order| &order.coffee_getter == coffee_getter)
            .take(limit as usize)
            .collect())
    }

    async fn record_response(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        wants_coffee: bool,
    ) -> Result<UserOrderResponse, RepositoryError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .responses
            .iter_mut()
            .find(|response| response.order_id == order_id && &response.user_id == user_id)
        {
            existing.wants_coffee = wants_coffee;
            return Ok(existing.clone());
        }

        let response = UserOrderResponse {
            id: state.responses.len() as i64 + 1,
            user_id: user_id.clone(),
            order_id,
            wants_coffee,
        };
        state.responses.push(response.clone());
        Ok(response)
    }

    async fn find_response(
        &self,
        order_id: OrderId,
        user_id: &UserId,
    ) -> Result<Option<UserOrderResponse>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .responses
            .iter()
            .find(|response| response.order_id == order_id && &response.user_id == user_id)
            .cloned())
    }

    async fn responses_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<UserOrderResponse>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .responses
            .iter()
            .filter(|response| response.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTestUserRepository {
    users: RwLock<HashMap<String, UserId>>,
}

#[async_trait::async_trait]
impl TestUserRepository for InMemoryTestUserRepository {
    async fn save(&self, user_name: &str, user_id: &UserId) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user_name.to_owned(), user_id.clone());
        Ok(())
    }

    async fn find_user_id(&self, user_name: &str) -> Result<Option<UserId>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(user_name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use coffeebot_core::domain::order::NewOrder;
    use coffeebot_core::domain::preference::{LocationMatch, NewDrinkPreference, NewShopPreference};
    use coffeebot_core::domain::user::UserId;

    use crate::repositories::{
        DrinkPreferenceRepository, InMemoryDrinkPreferenceRepository, InMemoryOrderRepository,
        InMemoryShopPreferenceRepository, InMemoryTestUserRepository, OrderRepository,
        ShopPreferenceRepository, TestUserRepository,
    };

    #[tokio::test]
    async fn in_memory_drink_latest_wins() {
        let repo = InMemoryDrinkPreferenceRepository::default();
        let user = UserId::new("U1");

        for size in ["small", "large"] {
            repo.save(
                &user,
                NewDrinkPreference {
                    size: size.to_owned(),
                    drink_type: "tea".to_owned(),
                    details: String::new(),
                },
            )
            .await
            .expect("save");
        }

        let latest = repo.latest_for_user(&user).await.expect("load").expect("present");
        assert_eq!(latest.size, "large");
    }

    #[tokio::test]
    async fn in_memory_shop_delete_honours_missing_location() {
        let repo = InMemoryShopPreferenceRepository::default();
        let user = UserId::new("U1");

        repo.save(&user, NewShopPreference { name: "tims".to_owned(), location: None })
            .await
            .expect("save");
        repo.save(
            &user,
            NewShopPreference { name: "tims".to_owned(), location: Some("campus".to_owned()) },
        )
        .await
        .expect("save");

        let deleted =
            repo.delete_matching(&user, "tims", &LocationMatch::Missing).await.expect("delete");
        assert_eq!(deleted, 1);
        assert_eq!(repo.list_all().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn in_memory_orders_upsert_responses() {
        let repo = InMemoryOrderRepository::default();
        let date = NaiveDate::from_ymd_opt(2020, 1, 10)
            .and_then(|date| date.and_hms_opt(16, 20, 0))
            .expect("timestamp");
        let order = repo
            .create(NewOrder {
                date,
                thread_id: Some("t1".to_owned()),
                channel_id: None,
                coffee_getter: UserId::new("U1"),
            })
            .await
            .expect("create");

        repo.record_response(&UserId::new("U2"), order.id, true).await.expect("respond");
        repo.record_response(&UserId::new("U2"), order.id, false).await.expect("respond again");

        let responses = repo.responses_for_order(order.id).await.expect("responses");
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].wants_coffee);
        assert_eq!(repo.find_by_date(date.date()).await.expect("by date"), Some(order));
    }

    #[tokio::test]
    async fn in_memory_test_user_lookup() {
        let repo = InMemoryTestUserRepository::default();
        repo.save("bobby", &UserId::new("U1")).await.expect("save");
        assert_eq!(repo.find_user_id("bobby").await.expect("find"), Some(UserId::new("U1")));
    }
}
