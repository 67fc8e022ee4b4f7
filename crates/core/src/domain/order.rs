use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// Storage and display format of order timestamps.
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub date: NaiveDateTime,
    pub thread_id: Option<String>,
    pub channel_id: Option<String>,
    pub coffee_getter: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub date: NaiveDateTime,
    pub thread_id: Option<String>,
    pub channel_id: Option<String>,
    pub coffee_getter: UserId,
}

impl Order {
    pub fn formatted_date(&self) -> String {
        self.date.format(ORDER_DATE_FORMAT).to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOrderResponse {
    pub id: i64,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub wants_coffee: bool,
}
