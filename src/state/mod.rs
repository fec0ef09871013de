use std::time::{SystemTime, UNIX_EPOCH};

pub mod account;
pub mod address;
pub mod transaction;

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
