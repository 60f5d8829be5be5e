//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::categorization::CategorizationServiceTrait;
use crate::infrastructure::ledger::UsageLedgerTrait;

/// Services shared by every handler, behind dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn UsageLedgerTrait>,
    pub categorizer: Arc<dyn CategorizationServiceTrait>,
    /// Shared secret for the admin API; None closes it
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn UsageLedgerTrait>,
        categorizer: Arc<dyn CategorizationServiceTrait>,
    ) -> Self {
        Self {
            ledger,
            categorizer,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token
            .filter(|t| !t.trim().is_empty())
            .map(|t| Arc::from(t.as_str()));
        self
    }
}
