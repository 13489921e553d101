use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::models::{RepositoryError, RepositoryResult};

/// Partition key attribute of the foods table
pub const FOODS_KEY_ATTRIBUTE: &str = "id";

const DEFAULT_MAX_ATTEMPTS: u32 = 30;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bootstraps the foods table: checks it at startup and creates it when allowed
pub struct TableManager {
    client: Arc<DynamoDbClient>,
    max_attempts: u32,
    poll_interval: Duration,
}

impl TableManager {
    /// Create a new table manager
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self {
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override how long to wait for a new table to become active
    pub fn with_polling(mut self, max_attempts: u32, poll_interval: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.poll_interval = poll_interval;
        self
    }

    /// Make sure the foods table exists.
    ///
    /// When the table is missing and `create` is false this fails with
    /// `TableNotFound`, so the service never starts against a store it cannot use.
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn ensure_foods_table(&self, table_name: &str, create: bool) -> RepositoryResult<()> {
        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        if !create {
            error!("Table {} is missing and table creation is disabled", table_name);
            return Err(RepositoryError::TableNotFound {
                table_name: table_name.to_string(),
            });
        }

        self.create_foods_table(table_name).await
    }

    /// Create the foods table keyed by the string `id` attribute
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn create_foods_table(&self, table_name: &str) -> RepositoryResult<()> {
        info!("Creating foods table");

        let (attribute_definition, key_schema) = foods_key_schema()?;

        let result = self
            .client
            .create_table()
            .table_name(table_name)
            .attribute_definitions(attribute_definition)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        if let Err(e) = result {
            // Another instance may have created it between the check and now
            if e
                .as_service_error()
                .is_some_and(|service| service.is_resource_in_use_exception())
            {
                warn!("Table {} is already being created", table_name);
            } else {
                error!("Failed to create table: {}", DisplayErrorContext(&e));
                return Err(RepositoryError::Connectivity {
                    message: DisplayErrorContext(&e).to_string(),
                });
            }
        }

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Foods table created successfully");

        Ok(())
    }

    /// Check if a table exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                info!("Table {} does not exist", table_name);
                Ok(false)
            }
            Err(e) => {
                error!("Error checking table existence: {}", DisplayErrorContext(&e));
                Err(RepositoryError::Connectivity {
                    message: DisplayErrorContext(&e).to_string(),
                })
            }
        }
    }

    /// Wait for a table to become active
    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let mut attempts = 0;

        loop {
            match self.client.describe_table().table_name(table_name).send().await {
                Ok(response) => {
                    let status = response.table.and_then(|table| table.table_status);
                    if is_active(status.as_ref()) {
                        info!("Table {} is now active", table_name);
                        return Ok(());
                    }
                    info!("Table {} status: {:?}, waiting...", table_name, status);
                }
                Err(e) => {
                    error!("Error checking table status: {}", DisplayErrorContext(&e));
                    return Err(RepositoryError::Connectivity {
                        message: DisplayErrorContext(&e).to_string(),
                    });
                }
            }

            attempts += 1;
            if attempts >= self.max_attempts {
                error!("Timeout waiting for table {} to become active", table_name);
                return Err(RepositoryError::Connectivity {
                    message: format!("Timed out waiting for table {} to become active", table_name),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn is_active(status: Option<&TableStatus>) -> bool {
    matches!(status, Some(TableStatus::Active))
}

/// Attribute definition and hash key for the foods table
pub fn foods_key_schema() -> RepositoryResult<(AttributeDefinition, KeySchemaElement)> {
    let attribute_definition = AttributeDefinition::builder()
        .attribute_name(FOODS_KEY_ATTRIBUTE)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| RepositoryError::Validation {
            message: format!("Failed to build attribute definition: {}", e),
        })?;

    let key_schema = KeySchemaElement::builder()
        .attribute_name(FOODS_KEY_ATTRIBUTE)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| RepositoryError::Validation {
            message: format!("Failed to build key schema: {}", e),
        })?;

    Ok((attribute_definition, key_schema))
}
