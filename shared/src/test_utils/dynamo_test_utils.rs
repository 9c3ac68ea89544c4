use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, GlobalSecondaryIndex, IndexStatus, KeySchemaElement,
    KeyType, Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client;
use std::collections::BTreeSet;
use std::error::Error;
// Use log macros, but ensure test_logging::init_test_logging() is called in test files
use log::{debug, error, info};

use crate::store::{invites, team_members};

/// # DynamoDB test utilities
///
/// Table helpers mirroring the deployed key schemas, for integration tests
/// against DynamoDB local. They only run when `USE_DYNAMODB=true`.
///
/// ## Example
/// ```rust,ignore
/// use volleygoals_shared::test_utils::test_logging::init_test_logging;
/// use volleygoals_shared::test_utils::dynamo_test_utils;
///
/// #[tokio::test]
/// async fn my_dynamo_test() {
///     init_test_logging();
///     if !dynamo_test_utils::use_dynamodb() {
///         return;
///     }
///     let client = dynamo_test_utils::create_dynamo_client().await;
///     dynamo_test_utils::create_invites_table(&client, "invites").await.unwrap();
/// }
/// ```

// Constants for DynamoDB tests
pub const DYNAMO_LOCAL_URI: &str = "http://localhost:8000";

/// One global secondary index: name plus (attribute, key type) pairs.
pub type IndexConfig<'a> = (&'a str, Vec<(&'a str, KeyType)>);

// Helper to check if DynamoDB integration tests should be used
pub fn use_dynamodb() -> bool {
    std::env::var("USE_DYNAMODB").unwrap_or_default() == "true"
}

// Helper to set up a DynamoDB client for local testing
pub async fn create_dynamo_client() -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .endpoint_url(DYNAMO_LOCAL_URI)
        .load()
        .await;

    Client::new(&config)
}

fn throughput() -> Result<ProvisionedThroughput, Box<dyn Error>> {
    Ok(ProvisionedThroughput::builder()
        .read_capacity_units(5)
        .write_capacity_units(5)
        .build()?)
}

async fn drop_table_if_exists(client: &Client, table_name: &str) -> Result<(), Box<dyn Error>> {
    let tables = client.list_tables().send().await?;
    if !tables.table_names().contains(&table_name.to_string()) {
        return Ok(());
    }

    info!(
        "Table '{}' already exists, deleting it first...",
        table_name
    );
    client.delete_table().table_name(table_name).send().await?;
    loop {
        let tables = client.list_tables().send().await?;
        if !tables.table_names().contains(&table_name.to_string()) {
            info!("Table '{}' successfully deleted!", table_name);
            return Ok(());
        }
        debug!("Table '{}' still exists, waiting...", table_name);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}

// Helper to create a table keyed by `id` with the given GSIs
pub async fn create_dynamo_table(
    client: &Client,
    table_name: &str,
    indexes: Vec<IndexConfig<'_>>,
) -> Result<(), Box<dyn Error>> {
    info!("Creating dynamo table '{}' with GSIs...", table_name);
    drop_table_if_exists(client, table_name).await?;

    let mut create_table_req = client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .provisioned_throughput(throughput()?);

    // Attributes used by several indexes are defined once
    let mut key_attributes = BTreeSet::from(["id"]);
    for (index_name, keys) in indexes {
        let mut gsi = GlobalSecondaryIndex::builder()
            .index_name(index_name)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .provisioned_throughput(throughput()?);

        for (attribute, key_type) in keys {
            key_attributes.insert(attribute);
            gsi = gsi.key_schema(
                KeySchemaElement::builder()
                    .attribute_name(attribute)
                    .key_type(key_type)
                    .build()?,
            );
        }
        create_table_req = create_table_req.global_secondary_indexes(gsi.build()?);
    }

    for attribute in key_attributes {
        create_table_req = create_table_req.attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(attribute)
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        );
    }

    info!("Creating table '{}'...", table_name);
    create_table_req.send().await?;

    // Wait for the table (and GSIs) to become ACTIVE before running tests
    info!("Waiting for table '{}' to become ACTIVE...", table_name);
    loop {
        let resp = client
            .describe_table()
            .table_name(table_name)
            .send()
            .await?;
        if let Some(table_desc) = resp.table() {
            if table_desc.table_status() == Some(&TableStatus::Active) {
                let gsi_descs = table_desc.global_secondary_indexes();
                if gsi_descs
                    .iter()
                    .all(|idx| idx.index_status() == Some(&IndexStatus::Active))
                {
                    info!("Table '{}' and all GSIs are now ACTIVE!", table_name);
                    break;
                }
                debug!("Table '{}' is ACTIVE but waiting for GSIs...", table_name);
            } else {
                debug!(
                    "Table '{}' status: {:?}",
                    table_name,
                    table_desc.table_status()
                );
            }
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    info!("Table '{}' is ready for testing!", table_name);
    Ok(())
}

// Helper to clean a DynamoDB table between tests
pub async fn clear_dynamo_table(client: &Client, table_name: &str) {
    let mut last_key = None;
    loop {
        let scan_resp = match client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(last_key.clone())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to scan table '{}': {}", table_name, e);
                break;
            }
        };

        for item in scan_resp.items() {
            if let Some(AttributeValue::S(id)) = item.get("id") {
                if let Err(e) = client
                    .delete_item()
                    .table_name(table_name)
                    .key("id", AttributeValue::S(id.clone()))
                    .send()
                    .await
                {
                    error!(
                        "Failed to delete item '{}' from table '{}': {}",
                        id, table_name, e
                    );
                }
            }
        }

        last_key = scan_resp.last_evaluated_key().cloned();
        if last_key.is_none() {
            break;
        }
    }
}

pub async fn create_invites_table(client: &Client, table_name: &str) -> Result<(), Box<dyn Error>> {
    create_dynamo_table(
        client,
        table_name,
        vec![
            (invites::TOKEN_INDEX, vec![("token", KeyType::Hash)]),
            (invites::TEAM_ID_INDEX, vec![("teamId", KeyType::Hash)]),
        ],
    )
    .await
}

pub async fn create_invite_tokens_table(
    client: &Client,
    table_name: &str,
) -> Result<(), Box<dyn Error>> {
    create_dynamo_table(client, table_name, vec![]).await
}

pub async fn create_teams_table(client: &Client, table_name: &str) -> Result<(), Box<dyn Error>> {
    create_dynamo_table(client, table_name, vec![]).await
}

pub async fn create_team_members_table(
    client: &Client,
    table_name: &str,
) -> Result<(), Box<dyn Error>> {
    create_dynamo_table(
        client,
        table_name,
        vec![
            (team_members::TEAM_ID_INDEX, vec![("teamId", KeyType::Hash)]),
            (
                team_members::TEAM_USER_INDEX,
                vec![("teamId", KeyType::Hash), ("userId", KeyType::Range)],
            ),
        ],
    )
    .await
}
