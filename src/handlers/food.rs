use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::error::{ApiError, Operation};
use crate::models::{Food, FoodPayload, MessageResponse};
use crate::services::FoodService;

/// Confirmation returned after a successful delete
pub const DELETED_MESSAGE: &str = "Food deleted successfully";

/// Shared state for the food routes
#[derive(Clone)]
pub struct FoodState {
    pub food_service: Arc<FoodService>,
}

/// Read a create/update body. Only `application/json` bodies are parsed;
/// any other body, or none at all, reads as an empty payload.
pub fn food_payload(headers: &HeaderMap, body: &Bytes) -> Result<FoodPayload, ApiError> {
    if !is_json_content(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FoodPayload::default());
    }

    let Json(payload) = Json::<FoodPayload>::from_bytes(body)?;
    Ok(payload)
}

fn is_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Root route
pub async fn home() -> &'static str {
    "Home Page"
}

/// List every food in insertion order
#[instrument(name = "list_foods", skip(state))]
pub async fn list_foods(State(state): State<FoodState>) -> Result<Json<Vec<Food>>, ApiError> {
    let foods = state
        .food_service
        .list_foods()
        .await
        .map_err(ApiError::service(Operation::List))?;

    Ok(Json(foods))
}

/// Get a specific food by ID
#[instrument(name = "get_food", skip(state), fields(food_id = %id))]
pub async fn get_food(
    State(state): State<FoodState>,
    Path(id): Path<String>,
) -> Result<Json<Food>, ApiError> {
    let food = state
        .food_service
        .get_food(&id)
        .await
        .map_err(ApiError::service(Operation::Get))?;

    Ok(Json(food))
}

/// Create a food from a partial body
#[instrument(name = "create_food", skip(state, headers, body))]
pub async fn create_food(
    State(state): State<FoodState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Food>), ApiError> {
    let payload = food_payload(&headers, &body?)?;

    let food = state
        .food_service
        .create_food(payload)
        .await
        .map_err(ApiError::service(Operation::Create))?;

    crate::info_with_trace!(food_id = %food.id, "Created food");
    Ok((StatusCode::CREATED, Json(food)))
}

/// Apply a partial body to an existing food
#[instrument(name = "update_food", skip(state, headers, body), fields(food_id = %id))]
pub async fn update_food(
    State(state): State<FoodState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Food>, ApiError> {
    let payload = food_payload(&headers, &body?)?;

    let food = state
        .food_service
        .update_food(&id, payload)
        .await
        .map_err(ApiError::service(Operation::Update))?;

    Ok(Json(food))
}

/// Delete a food
#[instrument(name = "delete_food", skip(state), fields(food_id = %id))]
pub async fn delete_food(
    State(state): State<FoodState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .food_service
        .delete_food(&id)
        .await
        .map_err(ApiError::service(Operation::Delete))?;

    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE.to_string(),
    }))
}
