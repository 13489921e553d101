use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::handlers::{food, health_check, metrics_handler, FoodState};
use crate::observability::{observability_middleware, Metrics};
use crate::services::FoodService;

/// Build the application router
pub fn create_app(
    food_service: Arc<FoodService>,
    metrics: Arc<Metrics>,
    server: &ServerConfig,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    let food_state = FoodState { food_service };

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        // Food endpoints
        .route("/", get(food::home))
        .route("/api/foods", get(food::list_foods).post(food::create_food))
        .route(
            "/api/foods/:id",
            get(food::get_food)
                .put(food::update_food)
                .delete(food::delete_food),
        )
        .with_state(food_state)
        // Middleware layers (outer to inner)
        .layer(DefaultBodyLimit::max(server.max_request_size))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
