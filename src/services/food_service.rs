use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    Food, FoodPayload, RepositoryResult, ServiceError, ServiceResult, UpdateEmptinessPolicy,
    Validate,
};
use crate::observability::{BusinessTracingMiddleware, DatabaseTracingMiddleware, Metrics};
use crate::repositories::FoodRepository;

/// Label used for store metrics when none is configured
const DEFAULT_STORE_LABEL: &str = "foods";

/// The five CRUD operations over the food collection
pub struct FoodService {
    repository: Arc<dyn FoodRepository>,
    update_policy: UpdateEmptinessPolicy,
    store_label: String,
    database_tracing: Option<DatabaseTracingMiddleware>,
    business_tracing: Option<BusinessTracingMiddleware>,
}

impl FoodService {
    /// Create a new FoodService
    pub fn new(repository: Arc<dyn FoodRepository>, update_policy: UpdateEmptinessPolicy) -> Self {
        Self {
            repository,
            update_policy,
            store_label: DEFAULT_STORE_LABEL.to_string(),
            database_tracing: None,
            business_tracing: None,
        }
    }

    /// Record store and operation metrics, labelling store calls with `store_label`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>, store_label: impl Into<String>) -> Self {
        self.store_label = store_label.into();
        self.database_tracing = Some(DatabaseTracingMiddleware::new(metrics.clone()));
        self.business_tracing = Some(BusinessTracingMiddleware::new(metrics));
        self
    }

    /// Every food in insertion order
    #[instrument(skip(self))]
    pub async fn list_foods(&self) -> ServiceResult<Vec<Food>> {
        self.track("list", async {
            let foods = self
                .store_call("find_all", self.repository.find_all())
                .await?;

            crate::info_with_trace!("Found {} foods", foods.len());
            Ok::<_, ServiceError>(foods)
        })
        .await
    }

    /// Get a specific food by ID
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_food(&self, id: &str) -> ServiceResult<Food> {
        self.track("get", async {
            self.store_call("find_by_id", self.repository.find_by_id(id))
                .await?
                .ok_or_else(|| not_found(id))
        })
        .await
    }

    /// Insert a new food; the store assigns its id
    #[instrument(skip(self, payload))]
    pub async fn create_food(&self, payload: FoodPayload) -> ServiceResult<Food> {
        self.track("create", async {
            let food = self
                .store_call("insert", self.repository.insert(payload))
                .await?;

            crate::info_with_trace!(id = %food.id, "Food created successfully");
            Ok::<_, ServiceError>(food)
        })
        .await
    }

    /// Apply the supplied fields to an existing food.
    ///
    /// An empty body is rejected before the store is consulted, so the result
    /// does not depend on whether `id` exists.
    #[instrument(skip(self, payload), fields(id = %id))]
    pub async fn update_food(&self, id: &str, payload: FoodPayload) -> ServiceResult<Food> {
        self.track("update", async {
            payload.validate_update(self.update_policy)?;

            let food = self
                .store_call("update_by_id", self.repository.update_by_id(id, payload))
                .await?
                .ok_or_else(|| not_found(id))?;

            crate::info_with_trace!("Food updated successfully");
            Ok::<_, ServiceError>(food)
        })
        .await
    }

    /// Remove a food and return it as it was stored
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_food(&self, id: &str) -> ServiceResult<Food> {
        self.track("delete", async {
            let food = self
                .store_call("delete_by_id", self.repository.delete_by_id(id))
                .await?
                .ok_or_else(|| not_found(id))?;

            crate::info_with_trace!("Food deleted successfully");
            Ok::<_, ServiceError>(food)
        })
        .await
    }

    async fn store_call<T, F>(&self, operation: &str, future: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        match &self.database_tracing {
            Some(middleware) => {
                middleware
                    .trace_operation(operation, &self.store_label, future)
                    .await
            }
            None => future.await,
        }
    }

    async fn track<T, F>(&self, operation: &str, future: F) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        match &self.business_tracing {
            Some(middleware) => middleware.trace_food_operation(operation, future).await,
            None => future.await,
        }
    }
}

fn not_found(id: &str) -> ServiceError {
    crate::info_with_trace!(id = %id, "Food not found");
    ServiceError::FoodNotFound { id: id.to_string() }
}
