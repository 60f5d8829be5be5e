//! Infrastructure layer - storage, ledger, model client and observability

pub mod categorization;
pub mod client;
pub mod ledger;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod storage;
