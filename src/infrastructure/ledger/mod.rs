//! Usage ledger

mod service;

pub use service::{UsageLedger, UsageLedgerTrait};
