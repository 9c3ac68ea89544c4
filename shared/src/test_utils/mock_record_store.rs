use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, ServiceError};
use crate::store::{PageRequest, PutCondition, RecordKey, RecordStore, StorePage};

/// Store operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    Put,
    Delete,
    FetchPage,
}

/// In-memory record store for testing.
///
/// Tables are ordered by `id`, which stands in for the store's natural
/// order. Like DynamoDB, a page limit counts examined records, so the filter
/// runs after the limit and a page may come back short.
pub struct MockRecordStore {
    tables: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    failures: Mutex<HashSet<(StoreOperation, String)>>,
    fetch_calls: Mutex<usize>,
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn record_id(key: &RecordKey) -> Result<&str> {
    key.get("id")
        .map(String::as_str)
        .ok_or_else(|| ServiceError::InternalError("Mock: key without id".into()))
}

impl MockRecordStore {
    /// Create a new empty MockRecordStore
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            fetch_calls: Mutex::new(0),
        }
    }

    /// Seeds a record without any condition checks
    pub fn insert(&self, table: &str, item: Value) {
        let id = item["id"].as_str().unwrap_or_default().to_string();
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .insert(id, item);
    }

    /// All records of a table in id order
    pub fn items(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.items(table).len()
    }

    /// Makes every later `operation` on `table` fail with an internal error
    pub fn fail_on(&self, operation: StoreOperation, table: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((operation, table.to_string()));
    }

    /// Number of query/scan calls issued so far
    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }

    fn check_failure(&self, operation: StoreOperation, table: &str) -> Result<()> {
        if self
            .failures
            .lock()
            .unwrap()
            .contains(&(operation, table.to_string()))
        {
            return Err(ServiceError::InternalError(format!(
                "Mock: {:?} on {} failed",
                operation, table
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn get(&self, table: &str, key: RecordKey) -> Result<Option<Value>> {
        self.check_failure(StoreOperation::Get, table)?;
        let id = record_id(&key)?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn put(&self, table: &str, item: Value, condition: PutCondition) -> Result<()> {
        self.check_failure(StoreOperation::Put, table)?;
        let id = item["id"]
            .as_str()
            .ok_or_else(|| ServiceError::InternalError("Mock: item without id".into()))?
            .to_string();

        let mut tables = self.tables.lock().unwrap();
        let records = tables.entry(table.to_string()).or_default();
        let existing = records.get(&id);

        let allowed = match &condition {
            PutCondition::Always => true,
            PutCondition::IfAbsent => existing.is_none(),
            PutCondition::IfAttributeEquals { attribute, value } => existing
                .and_then(|record| record.get(attribute))
                .and_then(Value::as_str)
                .map_or(false, |current| current == value),
        };
        if !allowed {
            return Err(ServiceError::ConditionFailed(format!(
                "Mock: {:?} rejected put of {} on {}",
                condition, id, table
            )));
        }

        records.insert(id, item);
        Ok(())
    }

    async fn delete(&self, table: &str, key: RecordKey) -> Result<()> {
        self.check_failure(StoreOperation::Delete, table)?;
        let id = record_id(&key)?;
        if let Some(records) = self.tables.lock().unwrap().get_mut(table) {
            records.remove(id);
        }
        Ok(())
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<StorePage> {
        self.check_failure(StoreOperation::FetchPage, &request.table)?;
        *self.fetch_calls.lock().unwrap() += 1;

        let tables = self.tables.lock().unwrap();
        let start_after = request
            .exclusive_start_key
            .as_ref()
            .and_then(|key| key.get("id").cloned());

        let candidates: Vec<&Value> = tables
            .get(&request.table)
            .map(|records| {
                records
                    .iter()
                    .filter(|(id, _)| start_after.as_ref().map_or(true, |after| *id > after))
                    .map(|(_, record)| record)
                    .filter(|record| request.key_condition.iter().all(|c| c.matches(record)))
                    .collect()
            })
            .unwrap_or_default();

        let limit = request.limit.unwrap_or(usize::MAX);
        let examined = &candidates[..candidates.len().min(limit)];

        let last_evaluated_key = if candidates.len() > examined.len() {
            examined.last().map(|record| {
                let mut key = RecordKey::new();
                for condition in &request.key_condition {
                    key.insert(
                        condition.attribute().to_string(),
                        condition.value().to_string(),
                    );
                }
                if let Some(id) = record["id"].as_str() {
                    key.insert("id".to_string(), id.to_string());
                }
                key
            })
        } else {
            None
        };

        let items = examined
            .iter()
            .filter(|record| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(record))
            })
            .map(|record| (*record).clone())
            .collect();

        Ok(StorePage {
            items,
            last_evaluated_key,
        })
    }
}
