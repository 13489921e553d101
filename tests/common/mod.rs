use std::sync::Arc;
use std::time::Duration;

use foods_api::config::ServerConfig;
use foods_api::models::{Food, UpdateEmptinessPolicy};
use foods_api::observability::Metrics;
use foods_api::repositories::InMemoryFoodRepository;
use foods_api::services::FoodService;
use foods_api::create_app;
use reqwest::Client;
use serde_json::Value;
use tokio::net::TcpListener;

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_policy(UpdateEmptinessPolicy::Falsy).await
    }

    /// Spawn the real router over an in-memory store
    pub async fn with_policy(update_policy: UpdateEmptinessPolicy) -> Self {
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let food_service = Arc::new(
            FoodService::new(Arc::new(InMemoryFoodRepository::new()), update_policy)
                .with_metrics(metrics.clone(), "memory"),
        );
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_request_size: 1024 * 1024,
            update_emptiness: update_policy.to_string(),
        };
        let app = create_app(food_service, metrics, &server);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { client, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_food(&self, body: &Value) -> Food {
        let response = self
            .client
            .post(self.url("/api/foods"))
            .json(body)
            .send()
            .await
            .expect("Failed to create food");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }
}
