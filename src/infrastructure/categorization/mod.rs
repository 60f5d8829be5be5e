//! Expense categorization service

mod service;

pub use service::{CategorizationService, CategorizationServiceTrait};
