use std::collections::HashSet;

use crate::db_types::TelegramId;

/// Decides whether an identity may perform operator-only actions (payment verification, product management).
pub trait OperatorPolicy: Send + Sync {
    fn is_operator(&self, id: TelegramId) -> bool;
}

/// A static allow-list of operator identities.
#[derive(Debug, Clone, Default)]
pub struct OperatorAllowList {
    ids: HashSet<TelegramId>,
}

impl OperatorAllowList {
    pub fn new<I: IntoIterator<Item = TelegramId>>(ids: I) -> Self {
        Self { ids: ids.into_iter().collect() }
    }

    pub fn operators(&self) -> impl Iterator<Item = &TelegramId> {
        self.ids.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl OperatorPolicy for OperatorAllowList {
    fn is_operator(&self, id: TelegramId) -> bool {
        self.ids.contains(&id)
    }
}
