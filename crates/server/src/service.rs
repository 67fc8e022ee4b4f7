use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use coffeebot_core::domain::order::{NewOrder, Order, OrderId};
use coffeebot_core::domain::preference::LocationMatch;
use coffeebot_core::domain::user::{UserId, UserReference};
use coffeebot_core::errors::{ApplicationError, DomainError};
use coffeebot_core::format::{self, OrderResponder};
use coffeebot_core::parse::{self, canonical_date};
use coffeebot_db::repositories::{
    DrinkPreferenceRepository, OrderRepository, RepositoryError, ShopPreferenceRepository,
    SqlDrinkPreferenceRepository, SqlOrderRepository, SqlShopPreferenceRepository,
    SqlTestUserRepository, TestUserRepository,
};
use coffeebot_db::DbPool;
use coffeebot_slack::{find_user_id_by_name, reply_user_ids, SlackError, SlackGateway};

/// Orders shown by the history commands.
pub const HISTORY_LIMIT: u32 = 20;

pub const ORDER_CREATED: &str = "Created a new coffee order!";

pub struct Repositories {
    pub drinks: Arc<dyn DrinkPreferenceRepository>,
    pub shops: Arc<dyn ShopPreferenceRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub test_users: Arc<dyn TestUserRepository>,
}

impl Repositories {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            drinks: Arc::new(SqlDrinkPreferenceRepository::new(pool.clone())),
            shops: Arc::new(SqlShopPreferenceRepository::new(pool.clone())),
            orders: Arc::new(SqlOrderRepository::new(pool.clone())),
            test_users: Arc::new(SqlTestUserRepository::new(pool)),
        }
    }
}

/// Handles every coffee command: reads and writes the stores, talks to
/// Slack and renders the reply text.
pub struct CoffeeService {
    repos: Repositories,
    slack: Arc<dyn SlackGateway>,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn integration(error: SlackError) -> ApplicationError {
    ApplicationError::Integration(error.to_string())
}

impl CoffeeService {
    pub fn new(repos: Repositories, slack: Arc<dyn SlackGateway>) -> Self {
        Self { repos, slack, clock: local_now }
    }

    /// Replaces the clock used to date new orders.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub async fn save_drink_preference(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        let drink = parse::parse_drink_preference(text).map_err(DomainError::from)?;
        let saved = self.repos.drinks.save(user_id, drink).await.map_err(persistence)?;

        info!(
            event_name = "coffee.preference.saved",
            user_id = %user_id,
            preference_id = saved.id,
            "drink preference saved"
        );
        Ok(format::saved_drink_preference_text(&saved))
    }

    /// Summary for the user named in `text`, or for the caller when it is empty.
    pub async fn describe_preferences(
        &self,
        caller: &UserId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        let user_id = match parse::parse_user_reference(text) {
            None => caller.clone(),
            Some(UserReference::Id(user_id)) => user_id,
            Some(UserReference::Name(name)) => self.resolve_username(&name).await?,
        };
        self.preferences_for(&user_id).await
    }

    pub async fn preferences_for(&self, user_id: &UserId) -> Result<String, ApplicationError> {
        let drink = self.repos.drinks.latest_for_user(user_id).await.map_err(persistence)?;
        let shop = self.repos.shops.latest_for_user(user_id).await.map_err(persistence)?;
        Ok(format::user_summary(user_id, drink.as_ref(), shop.as_ref()))
    }

    /// Looks a username up in Slack, then in the `test_user` directory.
    pub async fn resolve_username(&self, name: &str) -> Result<UserId, ApplicationError> {
        match self.slack.list_users().await {
            Ok(users) => {
                if let Some(user_id) = find_user_id_by_name(&users, name) {
                    return Ok(user_id);
                }
            }
            Err(error) => {
                warn!(
                    event_name = "coffee.user.lookup_failed",
                    user_name = name,
                    error = %error,
                    "slack user lookup failed, trying test users"
                );
            }
        }

        self.repos
            .test_users
            .find_user_id(name)
            .await
            .map_err(persistence)?
            .ok_or_else(|| DomainError::UnknownUser(name.to_owned()).into())
    }

    pub async fn save_shop_preference(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        let shop = parse::parse_shop_preference(text).map_err(DomainError::from)?;
        let saved = self.repos.shops.save(user_id, shop).await.map_err(persistence)?;

        info!(
            event_name = "coffee.shop.saved",
            user_id = %user_id,
            shop_id = saved.id,
            "shop preference saved"
        );
        Ok(format::saved_shop_preference_text(&saved))
    }

    pub async fn delete_shop_preference(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        let shop = parse::parse_shop_preference(text).map_err(DomainError::from)?;
        let location = LocationMatch::from_input(shop.location.as_deref());
        let deleted = self
            .repos
            .shops
            .delete_matching(user_id, &shop.name, &location)
            .await
            .map_err(persistence)?;

        info!(
            event_name = "coffee.shop.deleted",
            user_id = %user_id,
            deleted,
            "shop preferences deleted"
        );
        Ok(format::shop_deletion_text(deleted))
    }

    pub async fn list_shops(&self) -> Result<String, ApplicationError> {
        let shops = self.repos.shops.list_all().await.map_err(persistence)?;
        Ok(format::shop_list_text(&shops))
    }

    /// Announces a coffee run in `channel` and stores it with the caller as getter.
    pub async fn create_order(
        &self,
        caller: &UserId,
        channel: Option<&str>,
    ) -> Result<String, ApplicationError> {
        let channel = channel.ok_or_else(|| {
            DomainError::InvariantViolation("a coffee order needs a channel".to_owned())
        })?;

        let posted = self
            .slack
            .post_message(channel, &format::order_announcement(caller), None)
            .await
            .map_err(integration)?;

        let order = self
            .repos
            .orders
            .create(NewOrder {
                date: (self.clock)(),
                thread_id: Some(posted.ts),
                channel_id: Some(posted.channel),
                coffee_getter: caller.clone(),
            })
            .await
            .map_err(persistence)?;

        info!(
            event_name = "coffee.order.created",
            order_id = %order.id,
            coffee_getter = %caller,
            "coffee order created"
        );
        Ok(ORDER_CREATED.to_owned())
    }

    /// Shows the order for the date in `text`, or the latest order.
    ///
    /// Everyone who replied in the order's thread is counted as opted in
    /// unless they already answered.
    pub async fn display_order(&self, text: &str) -> Result<String, ApplicationError> {
        let text = text.trim();
        let order = if text.is_empty() {
            self.repos
                .orders
                .most_recent()
                .await
                .map_err(persistence)?
                .ok_or(DomainError::NoOrders)?
        } else {
            let date = parse::parse_order_date(text).map_err(DomainError::from)?;
            self.repos
                .orders
                .find_by_date(date)
                .await
                .map_err(persistence)?
                .ok_or_else(|| DomainError::NoOrderOnDate(canonical_date(date)))?
        };

        self.collect_thread_replies(&order).await?;
        self.render_order(&order).await
    }

    async fn collect_thread_replies(&self, order: &Order) -> Result<(), ApplicationError> {
        let (Some(channel), Some(thread)) =
            (order.channel_id.as_deref(), order.thread_id.as_deref())
        else {
            return Ok(());
        };

        let messages = self.slack.conversation_replies(channel, thread).await.map_err(integration)?;
        for user_id in reply_user_ids(&messages) {
            let existing =
                self.repos.orders.find_response(order.id, &user_id).await.map_err(persistence)?;
            if existing.is_none() && !self.is_bot_user(&user_id).await {
                self.repos
                    .orders
                    .record_response(&user_id, order.id, true)
                    .await
                    .map_err(persistence)?;
            }
        }
        Ok(())
    }

    /// A failed `users.info` lookup counts the user as a person.
    async fn is_bot_user(&self, user_id: &UserId) -> bool {
        match self.slack.user_info(user_id).await {
            Ok(user) => user.is_bot,
            Err(error) => {
                warn!(
                    event_name = "coffee.user.info_failed",
                    user_id = %user_id,
                    error = %error,
                    "slack user info lookup failed, treating replier as a person"
                );
                false
            }
        }
    }

    pub async fn order_summary(&self, order_id: OrderId) -> Result<String, ApplicationError> {
        let order = self.find_order(order_id).await?;
        self.render_order(&order).await
    }

    async fn render_order(&self, order: &Order) -> Result<String, ApplicationError> {
        let responses =
            self.repos.orders.responses_for_order(order.id).await.map_err(persistence)?;

        let mut responders = Vec::with_capacity(responses.len());
        for response in responses {
            let drink = if response.wants_coffee {
                self.repos.drinks.latest_for_user(&response.user_id).await.map_err(persistence)?
            } else {
                None
            };
            responders.push(OrderResponder {
                user_id: response.user_id,
                wants_coffee: response.wants_coffee,
                drink,
            });
        }

        Ok(format::order_summary(order, &responders))
    }

    pub async fn respond_to_order(
        &self,
        caller: &UserId,
        order_id: OrderId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        let wants_coffee = parse::parse_order_response(text).map_err(DomainError::from)?;
        let order = self.find_order(order_id).await?;
        self.repos
            .orders
            .record_response(caller, order.id, wants_coffee)
            .await
            .map_err(persistence)?;

        info!(
            event_name = "coffee.order.response_recorded",
            order_id = %order.id,
            user_id = %caller,
            wants_coffee,
            "order response recorded"
        );
        Ok(format::order_response_text(&order, wants_coffee))
    }

    pub async fn order_history(&self) -> Result<String, ApplicationError> {
        let orders = self.repos.orders.list_history(HISTORY_LIMIT).await.map_err(persistence)?;
        Ok(format::order_history_text(&orders))
    }

    pub async fn order_history_for(&self, user_id: &UserId) -> Result<String, ApplicationError> {
        let orders = self
            .repos
            .orders
            .list_by_getter(user_id, HISTORY_LIMIT)
            .await
            .map_err(persistence)?;
        Ok(format::order_history_text(&orders))
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        self.repos
            .orders
            .find_by_id(order_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.0).into())
    }
}
