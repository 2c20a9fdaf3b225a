use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;

/// Identity/session collaborator. A `None` owner means guest mode: the
/// course table is keyed by a locally persisted id instead of an account.
#[async_trait]
pub trait IdentitySession: Send + Sync {
    async fn current_owner(&self) -> Option<String>;
    async fn linked_tables(&self, owner_id: &str) -> Result<Vec<String>, AppError>;
    async fn link_table(&self, owner_id: &str, table_id: &str) -> Result<(), AppError>;
}

/// Session with nobody logged in.
pub struct GuestSession;

#[async_trait]
impl IdentitySession for GuestSession {
    async fn current_owner(&self) -> Option<String> {
        None
    }

    async fn linked_tables(&self, _owner_id: &str) -> Result<Vec<String>, AppError> {
        Ok(Vec::new())
    }

    async fn link_table(&self, _owner_id: &str, _table_id: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Fixed logged-in session backed by an in-memory table list, for tests.
pub struct InMemorySession {
    owner_id: String,
    tables: Mutex<Vec<String>>,
}

impl InMemorySession {
    pub fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            tables: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IdentitySession for InMemorySession {
    async fn current_owner(&self) -> Option<String> {
        Some(self.owner_id.clone())
    }

    async fn linked_tables(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        if owner_id != self.owner_id {
            return Ok(Vec::new());
        }
        Ok(self.tables.lock().expect("table list poisoned").clone())
    }

    async fn link_table(&self, owner_id: &str, table_id: &str) -> Result<(), AppError> {
        if owner_id == self.owner_id {
            self.tables
                .lock()
                .expect("table list poisoned")
                .push(table_id.to_string());
        }
        Ok(())
    }
}
