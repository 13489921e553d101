// Repositories module - data access layer

pub mod food_repository;
pub mod memory;
pub mod table_manager;

pub use food_repository::{DynamoDbFoodRepository, FoodRepository};
pub use memory::InMemoryFoodRepository;
pub use table_manager::TableManager;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::{DatabaseConfig, StoreConnection};
use crate::models::{RepositoryError, RepositoryResult};

/// Open the document store described by `config`.
///
/// For DynamoDB this checks the table (creating it when allowed), so an
/// unreachable store fails here rather than on the first request.
#[instrument(skip(config), fields(table = %config.table_name))]
pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Arc<dyn FoodRepository>> {
    let connection = config
        .store_connection()
        .map_err(|e| RepositoryError::Connectivity {
            message: e.to_string(),
        })?;

    match connection {
        StoreConnection::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(InMemoryFoodRepository::new()))
        }
        StoreConnection::DynamoDb { endpoint } => {
            info!(endpoint = %endpoint, region = %config.region, "Connecting to DynamoDB");

            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(aws_config::Region::new(config.region.clone()))
                .endpoint_url(endpoint.clone())
                .load()
                .await;
            let client = Arc::new(DynamoDbClient::new(&sdk_config));

            TableManager::new(client.clone())
                .ensure_foods_table(&config.table_name, config.create_table)
                .await?;

            info!("DynamoDB connection established");
            Ok(Arc::new(DynamoDbFoodRepository::new(
                client,
                config.table_name.clone(),
                config.region.clone(),
                Some(endpoint),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let repository = connect(&DatabaseConfig::in_memory()).await.unwrap();

        assert!(repository.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let mut config = DatabaseConfig::in_memory();
        config.connection = "ftp://foods".to_string();

        let result = connect(&config).await;
        assert!(matches!(result, Err(RepositoryError::Connectivity { .. })));
    }
}
