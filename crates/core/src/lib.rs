pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod parse;

pub use domain::order::{NewOrder, Order, OrderId, UserOrderResponse, ORDER_DATE_FORMAT};
pub use domain::preference::{
    DrinkPreference, LocationMatch, NewDrinkPreference, NewShopPreference, ShopPreference,
};
pub use domain::user::{UserId, UserReference};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use format::OrderResponder;
pub use parse::ParseError;
