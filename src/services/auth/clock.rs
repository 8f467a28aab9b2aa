//! Wall-clock source shared by the token codec and the gate stages.
//!
//! One instance is built at startup and injected everywhere a "now" is needed,
//! so expiry checks and logout timestamps always agree.
use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
