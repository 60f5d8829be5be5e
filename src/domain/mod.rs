pub mod categorization;
pub mod client;
pub mod error;
pub mod ledger;
pub mod llm;

pub use error::DomainError;
