use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use rust_decimal::Decimal;
use serde_json::Number;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, Instrument};

use crate::models::{
    format_timestamp, parse_expiration_date, Field, Food, FoodId, FoodPayload, RepositoryError,
    RepositoryResult,
};

/// The document-store boundary: find/insert/update/delete over food documents
#[async_trait]
pub trait FoodRepository: Send + Sync {
    /// Every stored food, in insertion order
    async fn find_all(&self) -> RepositoryResult<Vec<Food>>;

    /// Find a food by its ID
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Food>>;

    /// Persist a new food under a freshly assigned id
    async fn insert(&self, payload: FoodPayload) -> RepositoryResult<Food>;

    /// Apply the supplied fields to an existing food and return the new state
    async fn update_by_id(&self, id: &str, payload: FoodPayload)
        -> RepositoryResult<Option<Food>>;

    /// Remove a food and return the document as it was before removal
    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Option<Food>>;
}

/// A DynamoDB `UpdateItem` SET/REMOVE expression with its placeholder maps
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// DynamoDB implementation of the FoodRepository trait
pub struct DynamoDbFoodRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
    endpoint: String,
}

impl DynamoDbFoodRepository {
    /// Create a new DynamoDB food repository
    pub fn new(
        client: Arc<DynamoDbClient>,
        table_name: String,
        region: String,
        endpoint: Option<String>,
    ) -> Self {
        let endpoint =
            endpoint.unwrap_or_else(|| format!("https://dynamodb.{}.amazonaws.com", region));
        Self {
            client,
            table_name,
            region,
            endpoint,
        }
    }

    /// Create a DynamoDB client span carrying table and RPC attributes
    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.table_name,
            "aws.request_id" = tracing::field::Empty,

            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),

            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,

            "http.method" = "POST",
            "http.url" = %self.endpoint,
            "http.status_code" = tracing::field::Empty,

            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,
        )
    }

    /// Convert a Food struct to DynamoDB attribute values
    pub fn food_to_item(&self, food: &Food) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), AttributeValue::S(food.id.clone()));
        if let Some(ref name) = food.name {
            item.insert("name".to_string(), AttributeValue::S(name.clone()));
        }
        if let Some(ref category) = food.category {
            item.insert("category".to_string(), AttributeValue::S(category.clone()));
        }
        if let Some(ref quantity) = food.quantity {
            item.insert(
                "quantity".to_string(),
                AttributeValue::N(quantity.to_string()),
            );
        }
        if let Some(ref expiration_date) = food.expiration_date {
            item.insert(
                "expirationDate".to_string(),
                AttributeValue::S(format_timestamp(expiration_date)),
            );
        }
        if let Some(price) = food.price {
            item.insert("price".to_string(), AttributeValue::N(price.to_string()));
        }
        item.insert(
            "__v".to_string(),
            AttributeValue::N(food.schema_version.to_string()),
        );

        item
    }

    /// Convert DynamoDB item to Food struct
    pub fn item_to_food(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Food> {
        let id = item
            .get("id")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| malformed("Missing id"))?
            .clone();

        let name = optional_string(&item, "name")?;
        let category = optional_string(&item, "category")?;

        let quantity = optional_number(&item, "quantity")?
            .map(|raw| {
                Number::from_str(raw).map_err(|_| malformed(&format!("Invalid quantity {}", raw)))
            })
            .transpose()?;

        let expiration_date = optional_string(&item, "expirationDate")?
            .map(|raw| parse_expiration_date(&raw).map_err(|message| malformed(&message)))
            .transpose()?;

        let price = optional_number(&item, "price")?
            .map(|raw| {
                Decimal::from_str(raw).map_err(|_| malformed(&format!("Invalid price {}", raw)))
            })
            .transpose()?;

        let schema_version = optional_number(&item, "__v")?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        Ok(Food {
            id,
            name,
            category,
            quantity,
            expiration_date,
            price,
            schema_version,
        })
    }

    /// Convert scanned items in insertion order; a malformed document fails
    /// the whole listing, as it does a single lookup
    pub fn items_to_foods(
        &self,
        items: Vec<HashMap<String, AttributeValue>>,
    ) -> RepositoryResult<Vec<Food>> {
        let mut foods = items
            .into_iter()
            .map(|item| self.item_to_food(item))
            .collect::<RepositoryResult<Vec<_>>>()?;

        // Ids are time-ordered, so sorting restores insertion order after a scan
        foods.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(foods)
    }

    /// Convert an SDK failure into a RepositoryError, separating transport
    /// failures from errors the service returned
    fn map_sdk_error<E, R>(&self, error: SdkError<E, R>) -> RepositoryError
    where
        DynamoDbError: From<SdkError<E, R>>,
    {
        let transport_failure = matches!(
            error,
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
        );
        let error: DynamoDbError = error.into();

        if transport_failure {
            error!("DynamoDB unreachable: {}", DisplayErrorContext(&error));
            return RepositoryError::Connectivity {
                message: DisplayErrorContext(&error).to_string(),
            };
        }

        classify_dynamodb_error(&self.table_name, error)
    }
}

/// Map a DynamoDB service error onto the repository error taxonomy
pub fn classify_dynamodb_error(table_name: &str, error: DynamoDbError) -> RepositoryError {
    error!("DynamoDB error: {:?}", error);

    match error {
        DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
            table_name: table_name.to_string(),
        },
        DynamoDbError::InternalServerError(_)
        | DynamoDbError::ProvisionedThroughputExceededException(_)
        | DynamoDbError::RequestLimitExceeded(_) => RepositoryError::Connectivity {
            message: error.to_string(),
        },
        other => RepositoryError::Validation {
            message: other.to_string(),
        },
    }
}

/// Build the update for a payload: SET for every field given a value,
/// REMOVE for every field sent as `null`.
///
/// Returns `None` when the payload mentions no field at all.
pub fn build_update_expression(payload: &FoodPayload) -> Option<UpdateExpression> {
    let fields = [
        ("name", payload.name.as_ref().map(|name| AttributeValue::S(name.clone()))),
        (
            "category",
            payload
                .category
                .as_ref()
                .map(|category| AttributeValue::S(category.clone())),
        ),
        (
            "quantity",
            payload
                .quantity
                .as_ref()
                .map(|quantity| AttributeValue::N(quantity.to_string())),
        ),
        (
            "expirationDate",
            payload
                .expiration_date
                .as_ref()
                .map(|date| AttributeValue::S(format_timestamp(date))),
        ),
        (
            "price",
            payload
                .price
                .as_ref()
                .map(|price| AttributeValue::N(price.to_string())),
        ),
    ];

    let mut assignments = Vec::new();
    let mut removals = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (attribute, field) in fields {
        let placeholder = attribute.to_lowercase();
        match field {
            Field::Missing => continue,
            Field::Null => removals.push(format!("#{}", placeholder)),
            Field::Value(value) => {
                assignments.push(format!("#{0} = :{0}", placeholder));
                values.insert(format!(":{}", placeholder), value);
            }
        }
        names.insert(format!("#{}", placeholder), attribute.to_string());
    }

    let mut clauses = Vec::new();
    if !assignments.is_empty() {
        clauses.push(format!("SET {}", assignments.join(", ")));
    }
    if !removals.is_empty() {
        clauses.push(format!("REMOVE {}", removals.join(", ")));
    }

    if clauses.is_empty() {
        return None;
    }

    Some(UpdateExpression {
        expression: clauses.join(" "),
        names,
        values,
    })
}

fn malformed(message: &str) -> RepositoryError {
    RepositoryError::MalformedDocument {
        message: message.to_string(),
    }
}

fn optional_string(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> RepositoryResult<Option<String>> {
    match item.get(key) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(malformed(&format!("Invalid {}", key))),
    }
}

fn optional_number<'a>(
    item: &'a HashMap<String, AttributeValue>,
    key: &str,
) -> RepositoryResult<Option<&'a str>> {
    match item.get(key) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::N(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(malformed(&format!("Invalid {}", key))),
    }
}

#[async_trait]
impl FoodRepository for DynamoDbFoodRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Food>> {
        info!("Finding all foods");

        let scan_span = self.create_dynamodb_span("Scan");

        let items = async {
            let mut items = Vec::new();
            let mut exclusive_start_key = None;

            loop {
                let response = self
                    .client
                    .scan()
                    .table_name(&self.table_name)
                    .select(Select::AllAttributes)
                    .set_exclusive_start_key(exclusive_start_key)
                    .send()
                    .await
                    .map_err(|e| self.map_sdk_error(e))?;

                items.extend(response.items.unwrap_or_default());

                match response.last_evaluated_key {
                    Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                    _ => break,
                }
            }

            Ok::<_, RepositoryError>(items)
        }
        .instrument(scan_span)
        .await?;

        let foods = self.items_to_foods(items).map_err(|e| {
            error!("Failed to parse food item: {}", e);
            e
        })?;

        info!("Found {} foods", foods.len());
        Ok(foods)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Food>> {
        info!("Finding food by ID");

        let id = FoodId::parse(id)?;
        let get_span = self.create_dynamodb_span("GetItem");

        let response = async {
            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await;

            match &result {
                Ok(output) => {
                    tracing::Span::current().record("http.status_code", 200);
                    if let Some(request_id) = output.request_id() {
                        tracing::Span::current().record("aws.request_id", request_id);
                    }
                }
                Err(e) => {
                    tracing::Span::current().record("http.status_code", 400);
                    error!("DynamoDB GetItem failed: {}", e);
                }
            }

            result.map_err(|e| self.map_sdk_error(e))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => {
                let food = self.item_to_food(item)?;
                info!("Food found");
                Ok(Some(food))
            }
            None => {
                info!("Food not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, payload), fields(table = %self.table_name))]
    async fn insert(&self, payload: FoodPayload) -> RepositoryResult<Food> {
        let food = Food::new(FoodId::generate(), payload);
        info!(id = %food.id, "Inserting new food");

        let item = self.food_to_item(&food);
        let put_span = self.create_dynamodb_span("PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| self.map_sdk_error(e))
        }
        .instrument(put_span)
        .await?;

        info!("Food inserted successfully");
        Ok(food)
    }

    #[instrument(skip(self, payload), fields(table = %self.table_name, id = %id))]
    async fn update_by_id(
        &self,
        id: &str,
        payload: FoodPayload,
    ) -> RepositoryResult<Option<Food>> {
        info!("Updating food");

        let food_id = FoodId::parse(id)?;
        let Some(update) = build_update_expression(&payload) else {
            return self.find_by_id(food_id.as_str()).await;
        };

        let update_span = self.create_dynamodb_span("UpdateItem");

        let result = async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(food_id.to_string()))
                .update_expression(update.expression)
                .set_expression_attribute_names(Some(update.names))
                .set_expression_attribute_values(
                    (!update.values.is_empty()).then_some(update.values),
                )
                .condition_expression("attribute_exists(id)")
                .return_values(ReturnValue::AllNew)
                .send()
                .await
        }
        .instrument(update_span)
        .await;

        match result {
            Ok(output) => match output.attributes {
                Some(attributes) => {
                    let food = self.item_to_food(attributes)?;
                    info!("Food updated successfully");
                    Ok(Some(food))
                }
                None => Ok(None),
            },
            Err(e)
                if e.as_service_error()
                    .is_some_and(|service| service.is_conditional_check_failed_exception()) =>
            {
                info!("Food not found");
                Ok(None)
            }
            Err(e) => Err(self.map_sdk_error(e)),
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Option<Food>> {
        info!("Deleting food");

        let food_id = FoodId::parse(id)?;
        let delete_span = self.create_dynamodb_span("DeleteItem");

        let response = async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(food_id.to_string()))
                .return_values(ReturnValue::AllOld)
                .send()
                .await
                .map_err(|e| self.map_sdk_error(e))
        }
        .instrument(delete_span)
        .await?;

        match response.attributes {
            Some(attributes) if !attributes.is_empty() => {
                let food = self.item_to_food(attributes)?;
                info!("Food deleted successfully");
                Ok(Some(food))
            }
            _ => {
                info!("Food not found");
                Ok(None)
            }
        }
    }
}
