pub mod error;
pub mod item_id;
pub mod user;
