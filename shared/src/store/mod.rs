use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::filter::{Condition, Expression};

pub mod dynamo;
pub mod invites;
pub mod query;
pub mod team_members;
pub mod teams;

/// Primary key or last-evaluated key of a record, attribute name to string value.
pub type RecordKey = HashMap<String, String>;

pub fn id_key(id: &str) -> RecordKey {
    HashMap::from([("id".to_string(), id.to_string())])
}

/// Write precondition evaluated atomically by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PutCondition {
    Always,
    /// Fails when a record with the same key already exists.
    IfAbsent,
    /// Fails unless the stored record has `attribute == value`.
    IfAttributeEquals { attribute: String, value: String },
}

impl PutCondition {
    pub fn attribute_equals(attribute: &str, value: impl Into<String>) -> Self {
        PutCondition::IfAttributeEquals {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }
}

/// One query or scan call against a table.
///
/// With an empty `key_condition` the request is a scan, otherwise a query
/// over `index` (or the base table) with equality on every listed attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageRequest {
    pub table: String,
    pub index: Option<String>,
    pub key_condition: Vec<Condition>,
    pub filter: Option<Expression>,
    pub exclusive_start_key: Option<RecordKey>,
    pub limit: Option<usize>,
}

impl PageRequest {
    pub fn query(table: &str, index: &str, key_condition: Vec<Condition>) -> Self {
        Self {
            table: table.to_string(),
            index: Some(index.to_string()),
            key_condition,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Option<Expression>) -> Self {
        self.filter = filter;
        self
    }
}

/// Items of one store page plus the store's own continuation marker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StorePage {
    pub items: Vec<Value>,
    pub last_evaluated_key: Option<RecordKey>,
}

/// Key-value record store with secondary indexes.
///
/// Records cross this boundary as JSON objects so one implementation serves
/// every table; the typed repositories convert to and from models.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Gets a record by key, `None` when absent
    async fn get(&self, table: &str, key: RecordKey) -> Result<Option<Value>>;

    /// Writes a full record. A rejected condition yields `ConditionFailed`.
    async fn put(&self, table: &str, item: Value, condition: PutCondition) -> Result<()>;

    /// Deletes a record; deleting an absent key is not an error
    async fn delete(&self, table: &str, key: RecordKey) -> Result<()>;

    /// Issues exactly one query or scan call
    async fn fetch_page(&self, request: PageRequest) -> Result<StorePage>;
}
