//! Client account domain
//!
//! One account per issued API key: display name, usage counter and limit.

mod entity;
mod repository;

pub use entity::{
    redact_key, ClientAccount, ClientApiKey, ClientInfo, DEFAULT_USAGE_LIMIT, MAX_USAGE_LIMIT,
};
pub use repository::ClientAccountRepository;

#[cfg(test)]
pub use repository::MockClientAccountRepository;
