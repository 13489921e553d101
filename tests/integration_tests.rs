#![allow(clippy::needless_borrows_for_generic_args)]

use foods_api::models::{Food, MessageResponse, UpdateEmptinessPolicy};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

mod common;
use common::*;

const UNKNOWN_ID: &str = "660dee8fb9d129fd5da35308";

#[tokio::test]
async fn test_food_api_endpoints() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;

    // Create
    let created_food = test_env
        .create_food(&json!({
            "name": "Apple",
            "category": "Fruit",
            "quantity": 10,
            "expirationDate": "2024-05-01",
            "price": 2.5
        }))
        .await;
    assert_eq!(created_food.id.len(), 24);
    assert_eq!(created_food.name.as_deref(), Some("Apple"));
    assert_eq!(created_food.price, Some(dec!(2.5)));

    // Get returns the same fields with the date normalized
    let response = client
        .get(&test_env.url(&format!("/api/foods/{}", created_food.id)))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let retrieved: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(retrieved["_id"], created_food.id.as_str());
    assert_eq!(retrieved["name"], "Apple");
    assert_eq!(retrieved["category"], "Fruit");
    assert_eq!(retrieved["quantity"], 10);
    assert_eq!(retrieved["expirationDate"], "2024-05-01T00:00:00.000Z");
    assert_eq!(retrieved["price"], 2.5);

    // Update keeps the fields it does not mention
    let response = client
        .put(&test_env.url(&format!("/api/foods/{}", created_food.id)))
        .json(&json!({"quantity": 4, "price": 3.75}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let updated_food: Food = response.json().await.expect("Failed to parse response");
    assert_eq!(updated_food.id, created_food.id);
    assert_eq!(updated_food.name.as_deref(), Some("Apple"));
    assert_eq!(updated_food.price, Some(dec!(3.75)));
    assert_eq!(updated_food.quantity, Some(4u64.into()));

    // Delete
    let response = client
        .delete(&test_env.url(&format!("/api/foods/{}", created_food.id)))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let message: MessageResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(message.message, "Food deleted successfully");

    // Gone afterwards
    let response = client
        .get(&test_env.url(&format!("/api/foods/{}", created_food.id)))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 404);
    let message: MessageResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(message.message, "Food not found");
}

#[tokio::test]
async fn test_list_after_creates_and_deletes() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;

    let mut ids = Vec::new();
    for name in ["Apple", "Pear", "Milk", "Bread", "Rice"] {
        ids.push(test_env.create_food(&json!({ "name": name })).await.id);
    }

    for id in [&ids[1], &ids[3]] {
        let response = client
            .delete(&test_env.url(&format!("/api/foods/{}", id)))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = client
        .get(&test_env.url("/api/foods"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    let foods: Vec<Food> = response.json().await.expect("Failed to parse response");
    let listed: Vec<_> = foods.into_iter().map(|food| food.id).collect();
    assert_eq!(listed, vec![ids[0].clone(), ids[2].clone(), ids[4].clone()]);
}

#[tokio::test]
async fn test_empty_update_rejected_regardless_of_id() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let existing = test_env.create_food(&json!({"name": "Apple"})).await;

    for id in [existing.id.as_str(), UNKNOWN_ID] {
        let response = client
            .put(&test_env.url(&format!("/api/foods/{}", id)))
            .json(&json!({}))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status().as_u16(), 400);
        let message: MessageResponse = response.json().await.expect("Failed to parse response");
        assert_eq!(message.message, "No update data provided");
    }
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let url = test_env.url(&format!("/api/foods/{}", UNKNOWN_ID));

    let response = client.get(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .put(&url)
        .json(&json!({"name": "Apple"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client.delete(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_malformed_ids() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;
    let url = test_env.url("/api/foods/123");

    let response = client.get(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 500);
    let message: MessageResponse = response.json().await.expect("Failed to parse response");
    assert!(message.message.contains("123"));

    let response = client
        .put(&url)
        .json(&json!({"name": "Apple"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);

    let response = client.delete(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let test_env = TestEnvironment::new().await;

    let response = test_env
        .client
        .post(&test_env.url("/api/foods"))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 400);
    let message: MessageResponse = response.json().await.expect("Failed to parse response");
    assert!(!message.message.is_empty());
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let test_env = TestEnvironment::new().await;

    let food = test_env
        .create_food(&json!({"name": "Apple", "color": "red"}))
        .await;

    let response = test_env
        .client
        .get(&test_env.url(&format!("/api/foods/{}", food.id)))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.get("color").is_none());
}

#[tokio::test]
async fn test_null_clears_a_stored_field() {
    let test_env = TestEnvironment::new().await;
    let food = test_env
        .create_food(&json!({"name": "Apple", "category": "Fruit", "quantity": 3}))
        .await;
    let url = test_env.url(&format!("/api/foods/{}", food.id));

    let response = test_env
        .client
        .put(&url)
        .json(&json!({"category": null, "quantity": 4}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);

    let response = test_env
        .client
        .get(&url)
        .send()
        .await
        .expect("Failed to send request");
    let stored: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(stored["name"], "Apple");
    assert_eq!(stored["quantity"], 4);
    assert!(stored.get("category").is_none());
}

#[tokio::test]
async fn test_scalar_fields_are_cast() {
    let test_env = TestEnvironment::new().await;

    let food = test_env
        .create_food(&json!({"name": 42, "category": true, "quantity": " 7 ", "price": "1.25"}))
        .await;
    assert_eq!(food.name.as_deref(), Some("42"));
    assert_eq!(food.category.as_deref(), Some("true"));
    assert_eq!(food.quantity, Some(7u64.into()));
    assert_eq!(food.price, Some(dec!(1.25)));

    let response = test_env
        .client
        .put(&test_env.url(&format!("/api/foods/{}", food.id)))
        .json(&json!({"price": "cheap"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);
    let message: MessageResponse = response.json().await.expect("Failed to parse response");
    assert!(message.message.contains("Cast to Number failed"), "{}", message.message);
}

#[tokio::test]
async fn test_non_json_body_reads_as_empty() {
    let test_env = TestEnvironment::new().await;

    let response = test_env
        .client
        .post(&test_env.url("/api/foods"))
        .body("name=Apple")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.expect("Failed to parse response");
    assert!(created.get("name").is_none());

    let response = test_env
        .client
        .put(&test_env.url(&format!("/api/foods/{}", created["_id"].as_str().unwrap())))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("name=Pear")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);
    let message: MessageResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(message.message, "No update data provided");
}

#[tokio::test]
async fn test_zero_quantity_update_depends_on_policy() {
    let falsy = TestEnvironment::new().await;
    let food = falsy.create_food(&json!({"name": "Apple", "quantity": 3})).await;
    let response = falsy
        .client
        .put(&falsy.url(&format!("/api/foods/{}", food.id)))
        .json(&json!({"quantity": 0}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);

    let presence = TestEnvironment::with_policy(UpdateEmptinessPolicy::Presence).await;
    let food = presence
        .create_food(&json!({"name": "Apple", "quantity": 3}))
        .await;
    let response = presence
        .client
        .put(&presence.url(&format!("/api/foods/{}", food.id)))
        .json(&json!({"quantity": 0}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["quantity"], 0);
}

#[tokio::test]
async fn test_home_health_and_metrics() {
    let test_env = TestEnvironment::new().await;
    let client = &test_env.client;

    let response = client
        .get(&test_env.url("/"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.expect("Failed to read body"), "Home Page");

    let response = client
        .get(&test_env.url("/health/status"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let health: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "foods-api");

    let response = client
        .get(&test_env.url("/metrics"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 200);
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("endpoint=\"/health/status\""));
}
