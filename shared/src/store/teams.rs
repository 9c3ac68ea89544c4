use std::sync::Arc;

use super::query::{list_collection, CollectionSelector};
use super::{id_key, PutCondition, RecordStore};
use crate::error::Result;
use crate::filter::TeamFilter;
use crate::models::Team;
use crate::pagination::Page;

#[derive(Clone)]
pub struct TeamRepository {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl TeamRepository {
    pub fn new(store: Arc<dyn RecordStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Team>> {
        match self.store.get(&self.table, id_key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn put(&self, team: &Team) -> Result<()> {
        let item = serde_json::to_value(team)?;
        self.store.put(&self.table, item, PutCondition::Always).await
    }

    /// Scans the team table one store page at a time.
    pub async fn list(&self, filter: &TeamFilter) -> Result<Page<Team>> {
        list_collection(
            self.store.as_ref(),
            CollectionSelector::table(&self.table),
            filter,
        )
        .await
    }
}
