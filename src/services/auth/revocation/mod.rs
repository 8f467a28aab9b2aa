pub mod store;
pub mod valkey;

pub use store::{RevocationStore, token_fingerprint};
pub use valkey::ValkeyRevocationStore;
