//! DynamoDB store implementation.
//!
//! Provides `DynamoStore`, which implements `Store` against an Amazon DynamoDB table
//! (or a compatible endpoint such as DynamoDB Local or LocalStack).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ReturnConsumedCapacity,
    ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client;
use occ_demo_core::{Resource, ResourceKey};

use crate::codec::{decode, encode, encode_counter, key_attributes};
use crate::error::{Result, StoreError};
use crate::schema::{attr, expr};
use crate::Store;

/// Interval between table status polls in `ensure_table`.
const TABLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Maximum number of table status polls in `ensure_table`.
const TABLE_POLL_ATTEMPTS: u32 = 60;

/// DynamoDB store configuration.
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// DynamoDB table name.
    pub table_name: String,
    /// AWS region (optional, uses SDK default if not specified).
    pub region: Option<String>,
    /// Optional endpoint override (e.g. DynamoDB Local).
    pub endpoint: Option<String>,
    /// Operation timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl DynamoDbConfig {
    /// Configuration for a table with SDK defaults for everything else.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            region: None,
            endpoint: None,
            timeout_ms: None,
        }
    }

    /// Apply `OCC_DYNAMODB_REGION`, `OCC_DYNAMODB_ENDPOINT`, and
    /// `OCC_DYNAMODB_TIMEOUT_MS` overrides from the environment.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(region) = std::env::var("OCC_DYNAMODB_REGION") {
            self.region = Some(region);
        }
        if let Ok(endpoint) = std::env::var("OCC_DYNAMODB_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        match std::env::var("OCC_DYNAMODB_TIMEOUT_MS").map(|v| v.parse::<u64>()) {
            Ok(Ok(ms)) => self.timeout_ms = Some(ms),
            Ok(Err(e)) => tracing::warn!(error = %e, "Ignoring invalid OCC_DYNAMODB_TIMEOUT_MS"),
            Err(_) => {}
        }
        self
    }
}

/// DynamoDB-backed store.
///
/// Reads are strongly consistent. Conditional writes use a `PutItem` whose condition
/// compares the stored `num_calls` with the value the caller read.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoStore")
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

impl DynamoStore {
    /// Create a store from a loaded SDK configuration.
    ///
    /// The DynamoDB client inherits the SDK config (credentials, retry policy, HTTP
    /// client) and then applies the region, endpoint, and timeout overrides.
    #[must_use]
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoDbConfig) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table_name: config.table_name,
        }
    }

    /// Load the ambient AWS configuration (environment, profile, IMDS) and create a store.
    pub async fn from_env(config: DynamoDbConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(&sdk_config, config)
    }

    /// Create from a pre-built client.
    #[must_use]
    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// The table this store reads and writes.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create the table if it does not exist and wait until it is active.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if creation fails for any reason other than
    /// the table already existing, or if it never becomes active.
    pub async fn ensure_table(&self) -> Result<()> {
        let resource_id = key_definition(attr::RESOURCE_ID)?;
        let account_id = key_definition(attr::ACCOUNT_ID)?;
        let hash = key_element(attr::RESOURCE_ID, KeyType::Hash)?;
        let range = key_element(attr::ACCOUNT_ID, KeyType::Range)?;

        let result = self
            .client
            .create_table()
            .table_name(&self.table_name)
            .attribute_definitions(resource_id)
            .attribute_definitions(account_id)
            .key_schema(hash)
            .key_schema(range)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => tracing::info!(table = %self.table_name, "Created table"),
            Err(SdkError::ServiceError(e))
                if matches!(e.err(), CreateTableError::ResourceInUseException(_)) =>
            {
                tracing::debug!(table = %self.table_name, "Table already exists");
            }
            Err(e) => {
                return Err(StoreError::Transport(format!(
                    "DynamoDB CreateTable failed: {}",
                    DisplayErrorContext(&e)
                )))
            }
        }

        self.wait_until_active().await
    }

    async fn wait_until_active(&self) -> Result<()> {
        for _ in 0..TABLE_POLL_ATTEMPTS {
            let response = self
                .client
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| {
                    StoreError::Transport(format!(
                        "DynamoDB DescribeTable failed: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            let status = response.table().and_then(|t| t.table_status());
            if status == Some(&TableStatus::Active) {
                return Ok(());
            }
            tracing::debug!(table = %self.table_name, ?status, "Waiting for table");
            tokio::time::sleep(TABLE_POLL_INTERVAL).await;
        }

        Err(StoreError::Transport(format!(
            "table {} did not become active",
            self.table_name
        )))
    }

    fn log_consumed_capacity(&self, output: &PutItemOutput) {
        if let Some(units) = output.consumed_capacity().and_then(|c| c.capacity_units()) {
            tracing::debug!(table = %self.table_name, units, "PutItem consumed capacity");
        }
    }

    /// Check if a `PutItem` error is a conditional check failure.
    fn is_conditional_check_failed(
        err: &SdkError<PutItemError, aws_sdk_dynamodb::config::http::HttpResponse>,
    ) -> bool {
        match err {
            SdkError::ServiceError(service_err) => matches!(
                service_err.err(),
                PutItemError::ConditionalCheckFailedException(_)
            ),
            _ => false,
        }
    }
}

fn key_definition(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| StoreError::Transport(format!("invalid attribute definition: {e}")))
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| StoreError::Transport(format!("invalid key schema: {e}")))
}

#[async_trait]
impl Store for DynamoStore {
    async fn get(&self, key: &ResourceKey) -> Result<Resource> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                StoreError::Transport(format!(
                    "DynamoDB GetItem failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let item = response
            .item()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(decode(item)?)
    }

    async fn put_unconditional(&self, resource: &Resource) -> Result<()> {
        let output = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(encode(resource)))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(|e| {
                StoreError::Transport(format!(
                    "DynamoDB PutItem failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        self.log_consumed_capacity(&output);
        Ok(())
    }

    async fn put_if(&self, resource: &Resource, expected_num_calls: u64) -> Result<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(encode(resource)))
            .condition_expression(expr::NUM_CALLS_UNCHANGED)
            .expression_attribute_names(expr::NUM_CALLS_NAME, attr::NUM_CALLS)
            .expression_attribute_values(expr::EXPECTED_VALUE, encode_counter(expected_num_calls))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await;

        match result {
            Ok(output) => {
                self.log_consumed_capacity(&output);
                Ok(())
            }
            Err(e) if Self::is_conditional_check_failed(&e) => Err(StoreError::Conflict {
                expected: expected_num_calls,
            }),
            Err(e) => Err(StoreError::Transport(format!(
                "DynamoDB PutItem failed: {}",
                DisplayErrorContext(&e)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = DynamoDbConfig::new("resources");
        assert_eq!(config.table_name, "resources");
        assert!(config.region.is_none());
        assert!(config.endpoint.is_none());
        assert!(config.timeout_ms.is_none());
    }

    #[test]
    fn debug_hides_client() {
        let conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .build();
        let store = DynamoStore::from_client(Client::from_conf(conf), "resources");
        let debug = format!("{store:?}");
        assert!(debug.contains("resources"));
        assert!(!debug.contains("client"));
        assert_eq!(store.table_name(), "resources");
    }
}
