pub mod health;
pub mod stores;
pub mod token;
pub mod users;
