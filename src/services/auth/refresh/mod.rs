pub mod store;
pub mod valkey;

pub use store::RefreshTokenStore;
pub use valkey::ValkeyRefreshTokenStore;
