pub mod order;
pub mod preference;
pub mod user;
