use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, instrument};

use super::FoodRepository;
use crate::models::{Food, FoodId, FoodPayload, RepositoryError, RepositoryResult};

/// In-process document store, selected with `DB_CONNECTION=memory://`.
///
/// Documents are keyed by id; ids are time-ordered so iteration order is
/// insertion order.
#[derive(Default)]
pub struct InMemoryFoodRepository {
    foods: Mutex<BTreeMap<String, Food>>,
}

impl InMemoryFoodRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> RepositoryResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, BTreeMap<String, Food>>> {
        self.foods.lock().map_err(|_| RepositoryError::Connectivity {
            message: "In-memory store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl FoodRepository for InMemoryFoodRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Food>> {
        let foods: Vec<Food> = self.lock()?.values().cloned().collect();
        info!("Found {} foods", foods.len());
        Ok(foods)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Food>> {
        let id = FoodId::parse(id)?;
        Ok(self.lock()?.get(id.as_str()).cloned())
    }

    #[instrument(skip(self, payload))]
    async fn insert(&self, payload: FoodPayload) -> RepositoryResult<Food> {
        let food = Food::new(FoodId::generate(), payload);
        self.lock()?.insert(food.id.clone(), food.clone());
        info!(id = %food.id, "Food inserted");
        Ok(food)
    }

    #[instrument(skip(self, payload), fields(id = %id))]
    async fn update_by_id(
        &self,
        id: &str,
        payload: FoodPayload,
    ) -> RepositoryResult<Option<Food>> {
        let id = FoodId::parse(id)?;
        let mut foods = self.lock()?;

        Ok(foods.get_mut(id.as_str()).map(|food| {
            food.apply(payload);
            food.clone()
        }))
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_by_id(&self, id: &str) -> RepositoryResult<Option<Food>> {
        let id = FoodId::parse(id)?;
        Ok(self.lock()?.remove(id.as_str()))
    }
}
