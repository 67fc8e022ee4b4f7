use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrinkPreference {
    pub size: String,
    pub drink_type: String,
    pub details: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkPreference {
    pub id: i64,
    pub user_id: UserId,
    pub size: String,
    pub drink_type: String,
    pub details: String,
    pub created_at: NaiveDateTime,
}

impl DrinkPreference {
    pub fn is_set(&self) -> bool {
        !(self.size.is_empty() && self.drink_type.is_empty() && self.details.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShopPreference {
    pub name: String,
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopPreference {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub location: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ShopPreference {
    pub fn display_name(&self) -> String {
        match self.location.as_deref().filter(|location| !location.is_empty()) {
            Some(location) => format!("{}, {location}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Location filter used when deleting shop preferences.
///
/// The literal text `null` selects rows saved without a location, matching
/// what users type in chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocationMatch {
    Missing,
    Exactly(String),
}

impl LocationMatch {
    pub fn from_input(location: Option<&str>) -> Self {
        match location.map(str::trim) {
            None | Some("") => Self::Missing,
            Some(value) if value.eq_ignore_ascii_case("null") => Self::Missing,
            Some(value) => Self::Exactly(value.to_owned()),
        }
    }

    pub fn matches(&self, location: Option<&str>) -> bool {
        match self {
            Self::Missing => location.is_none(),
            Self::Exactly(expected) => location == Some(expected.as_str()),
        }
    }
}
