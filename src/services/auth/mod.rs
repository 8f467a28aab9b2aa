pub mod clock;
pub mod deadline;
pub mod refresh;
pub mod revocation;
pub mod token_codec;
pub mod token_service;

pub use clock::{Clock, SystemClock};
pub use token_codec::TokenCodec;
pub use token_service::TokenService;
