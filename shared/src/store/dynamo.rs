use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, to_item};
use serde_json::Value;
use std::collections::HashMap;

use super::{PageRequest, PutCondition, RecordKey, RecordStore, StorePage};
use crate::error::{map_dynamo_error, Result, ServiceError};
use crate::filter::Condition;

/// DynamoDB implementation of the record store.
///
/// One client serves every table; it is built once at process start and
/// shared by reference.
#[derive(Clone)]
pub struct DynamoRecordStore {
    client: Client,
}

impl DynamoRecordStore {
    /// Creates a new DynamoDB store from the ambient AWS configuration
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::with_client(Client::new(&config))
    }

    /// Creates a store around an existing client.
    /// This is mainly useful for testing with a local DynamoDB instance.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_attribute_key(key: RecordKey) -> HashMap<String, AttributeValue> {
    key.into_iter()
        .map(|(name, value)| (name, AttributeValue::S(value)))
        .collect()
}

// Keys only ever hold string attributes
fn from_attribute_key(key: &HashMap<String, AttributeValue>) -> RecordKey {
    key.iter()
        .filter_map(|(name, value)| match value {
            AttributeValue::S(s) => Some((name.clone(), s.clone())),
            _ => None,
        })
        .collect()
}

/// Placeholder-based expression text plus its attribute names and values.
#[derive(Default)]
struct RenderedExpression {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl RenderedExpression {
    /// Renders conditions joined by AND, using `prefix` to keep placeholders
    /// of the key condition and the filter apart.
    fn render(&mut self, conditions: &[Condition], prefix: &str) -> Option<String> {
        if conditions.is_empty() {
            return None;
        }

        let parts: Vec<String> = conditions
            .iter()
            .enumerate()
            .map(|(i, condition)| {
                let name = format!("#{}{}", prefix, i);
                let value = format!(":{}{}", prefix, i);
                self.names
                    .insert(name.clone(), condition.attribute().to_string());
                self.values.insert(
                    value.clone(),
                    AttributeValue::S(condition.value().to_string()),
                );
                match condition {
                    Condition::Equals { .. } => format!("{} = {}", name, value),
                    Condition::Contains { .. } => format!("contains({}, {})", name, value),
                }
            })
            .collect();

        Some(parts.join(" AND "))
    }

    fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    fn values(&self) -> Option<HashMap<String, AttributeValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

fn to_store_page(
    items: &[HashMap<String, AttributeValue>],
    last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
) -> Result<StorePage> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        let value: Value = from_item(item.clone())?;
        values.push(value);
    }

    let last_evaluated_key = last_evaluated_key
        .map(from_attribute_key)
        .filter(|key| !key.is_empty());

    Ok(StorePage {
        items: values,
        last_evaluated_key,
    })
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn get(&self, table: &str, key: RecordKey) -> Result<Option<Value>> {
        let response = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_attribute_key(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_dynamo_error("get_item", e))?;

        match response.item() {
            Some(item) => Ok(Some(from_item(item.clone())?)),
            None => Ok(None),
        }
    }

    async fn put(&self, table: &str, item: Value, condition: PutCondition) -> Result<()> {
        let item: HashMap<String, AttributeValue> = to_item(item)?;

        let mut request = self.client.put_item().table_name(table).set_item(Some(item));

        request = match &condition {
            PutCondition::Always => request,
            PutCondition::IfAbsent => request
                .condition_expression("attribute_not_exists(#pk)")
                .expression_attribute_names("#pk", "id"),
            PutCondition::IfAttributeEquals { attribute, value } => request
                .condition_expression("#c = :c")
                .expression_attribute_names("#c", attribute)
                .expression_attribute_values(":c", AttributeValue::S(value.clone())),
        };

        if let Err(err) = request.send().await {
            let condition_failed = matches!(
                &err,
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), PutItemError::ConditionalCheckFailedException(_))
            );
            if condition_failed {
                return Err(ServiceError::ConditionFailed(format!(
                    "put_item on {}: {:?}",
                    table, condition
                )));
            }
            return Err(map_dynamo_error("put_item", err));
        }

        Ok(())
    }

    async fn delete(&self, table: &str, key: RecordKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_attribute_key(key)))
            .send()
            .await
            .map_err(|e| map_dynamo_error("delete_item", e))?;

        Ok(())
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<StorePage> {
        let mut rendered = RenderedExpression::default();
        let key_expression = rendered.render(&request.key_condition, "k");
        let filter_expression = request
            .filter
            .as_ref()
            .and_then(|filter| rendered.render(&filter.conditions, "f"));
        let start_key = request.exclusive_start_key.map(to_attribute_key);
        let limit = request.limit.map(|limit| limit as i32);

        match key_expression {
            // No key condition: full scan within one store page
            None => {
                let response = self
                    .client
                    .scan()
                    .table_name(&request.table)
                    .set_index_name(request.index)
                    .set_filter_expression(filter_expression)
                    .set_expression_attribute_names(rendered.names())
                    .set_expression_attribute_values(rendered.values())
                    .set_exclusive_start_key(start_key)
                    .set_limit(limit)
                    .send()
                    .await
                    .map_err(|e| map_dynamo_error("scan", e))?;

                to_store_page(response.items(), response.last_evaluated_key())
            }
            Some(key_expression) => {
                let response = self
                    .client
                    .query()
                    .table_name(&request.table)
                    .set_index_name(request.index)
                    .key_condition_expression(key_expression)
                    .set_filter_expression(filter_expression)
                    .set_expression_attribute_names(rendered.names())
                    .set_expression_attribute_values(rendered.values())
                    .set_exclusive_start_key(start_key)
                    .set_limit(limit)
                    .send()
                    .await
                    .map_err(|e| map_dynamo_error("query", e))?;

                to_store_page(response.items(), response.last_evaluated_key())
            }
        }
    }
}
