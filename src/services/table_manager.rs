use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::IdentitySession;
use crate::models::{CourseTable, NewTableRequest};
use crate::store::LocalStore;
use crate::table_api::CourseTableApi;

pub const DEFAULT_TABLE_NAME: &str = "My Course Table";

#[derive(Debug)]
pub enum TableStatus {
    Ready(CourseTable),
    /// No table exists yet for this session; offer creation.
    Missing,
    /// The table id points at a deleted or expired record. Terminal: the only
    /// forward path is creating a fresh table, never reusing the dead id.
    Expired,
}

/// Surface-open flow: decide which course table a session works on, create
/// one when there is none, and keep the anonymous table id persisted locally
/// for guest sessions.
pub struct TableManager {
    api: Arc<dyn CourseTableApi>,
    identity: Arc<dyn IdentitySession>,
    store: LocalStore,
}

impl TableManager {
    pub fn new(
        api: Arc<dyn CourseTableApi>,
        identity: Arc<dyn IdentitySession>,
        store: LocalStore,
    ) -> Self {
        Self {
            api,
            identity,
            store,
        }
    }

    pub async fn resolve(&self) -> Result<TableStatus, AppError> {
        match self.identity.current_owner().await {
            Some(owner) => {
                let linked = self.identity.linked_tables(&owner).await?;
                match linked.first() {
                    Some(table_id) => self.fetch_status(table_id).await,
                    None => Ok(TableStatus::Missing),
                }
            }
            None => match self.store.anonymous_table_id().await? {
                Some(table_id) => self.fetch_status(&table_id).await,
                None => Ok(TableStatus::Missing),
            },
        }
    }

    pub async fn create(&self, name: &str, semester: &str) -> Result<CourseTable, AppError> {
        let id = Uuid::new_v4().to_string();
        match self.identity.current_owner().await {
            Some(owner) => {
                let table = self
                    .api
                    .create_table(&NewTableRequest {
                        id,
                        name: name.to_string(),
                        user_id: Some(owner.clone()),
                        semester: semester.to_string(),
                    })
                    .await?;
                self.identity.link_table(&owner, &table.id).await?;
                info!(table_id = %table.id, owner = %owner, "course table created");
                Ok(table)
            }
            None => {
                let table = self
                    .api
                    .create_table(&NewTableRequest {
                        id,
                        name: name.to_string(),
                        user_id: None,
                        semester: semester.to_string(),
                    })
                    .await?;
                // Recreation after expiry overwrites the dead id.
                self.store.set_anonymous_table_id(&table.id).await?;
                info!(table_id = %table.id, "guest course table created");
                Ok(table)
            }
        }
    }

    /// Change the display name, keeping the course sequence as stored.
    pub async fn rename(
        &self,
        table: &CourseTable,
        new_name: &str,
    ) -> Result<CourseTable, AppError> {
        match self
            .api
            .replace_table(
                &table.id,
                new_name,
                table.user_id.as_deref(),
                table.expire_ts,
                &table.courses,
            )
            .await?
        {
            Some(updated) => Ok(updated),
            None => {
                warn!(table_id = %table.id, "rename rejected, course table gone");
                Err(AppError::Expired)
            }
        }
    }

    async fn fetch_status(&self, table_id: &str) -> Result<TableStatus, AppError> {
        match self.api.fetch_table(table_id).await? {
            Some(table) if table.is_expired(Utc::now()) => {
                warn!(table_id = %table_id, "course table past expiry");
                Ok(TableStatus::Expired)
            }
            Some(table) => Ok(TableStatus::Ready(table)),
            None => Ok(TableStatus::Expired),
        }
    }
}
