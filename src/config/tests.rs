use super::*;

fn env(pairs: &[(&str, &str)]) -> Option<EnvSource> {
    Some(
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    )
}

fn memory() -> Option<String> {
    Some("memory://".to_string())
}

#[test]
fn test_defaults() {
    let config = Config::from_source(env(&[]), memory()).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.max_request_size, 1024 * 1024);
    assert_eq!(
        config.server.update_emptiness_policy().unwrap(),
        UpdateEmptinessPolicy::Falsy
    );
    assert_eq!(config.database.table_name, "foods");
    assert_eq!(config.database.region, "us-east-1");
    assert!(config.database.create_table);
    assert_eq!(config.observability.service_name, "foods-api");
    assert_eq!(
        config.observability.service_version,
        env!("CARGO_PKG_VERSION")
    );
    assert_eq!(config.observability.otlp_endpoint, None);
    assert!(!config.observability.enable_json_logging);
}

#[test]
fn test_prefixed_overrides() {
    let config = Config::from_source(
        env(&[
            ("FOODS_HOST", "127.0.0.1"),
            ("FOODS_PORT", "8081"),
            ("FOODS_MAX_REQUEST_SIZE", "2048"),
            ("FOODS_UPDATE_EMPTINESS", "presence"),
            ("FOODS_TABLE_NAME", "pantry"),
            ("FOODS_REGION", "eu-west-1"),
            ("FOODS_CREATE_TABLE", "false"),
            ("FOODS_SERVICE_NAME", "pantry-api"),
            ("FOODS_OTLP_ENDPOINT", "http://collector:4317"),
            ("FOODS_ENABLE_JSON_LOGGING", "true"),
            ("FOODS_LOG_LEVEL", "debug"),
        ]),
        Some("http://localhost:8000".to_string()),
    )
    .unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.max_request_size, 2048);
    assert_eq!(
        config.server.update_emptiness_policy().unwrap(),
        UpdateEmptinessPolicy::Presence
    );
    assert_eq!(config.database.table_name, "pantry");
    assert_eq!(config.database.region, "eu-west-1");
    assert!(!config.database.create_table);
    assert_eq!(
        config.database.store_connection().unwrap(),
        StoreConnection::DynamoDb {
            endpoint: "http://localhost:8000".to_string()
        }
    );
    assert_eq!(config.observability.service_name, "pantry-api");
    assert_eq!(
        config.observability.otlp_endpoint.as_deref(),
        Some("http://collector:4317")
    );
    assert!(config.observability.enable_json_logging);
    assert_eq!(config.observability.log_level, "debug");
}

#[test]
fn test_missing_connection_string() {
    for connection in [None, Some("   ".to_string())] {
        match Config::from_source(env(&[]), connection) {
            Err(ConfigError::MissingEnvironmentVariable { name }) => {
                assert_eq!(name, "DB_CONNECTION")
            }
            other => panic!("expected missing DB_CONNECTION, got {:?}", other),
        }
    }
}

#[test]
fn test_validation_failures() {
    let cases: [(&[(&str, &str)], Option<String>); 5] = [
        (&[("FOODS_PORT", "0")], memory()),
        (&[("FOODS_MAX_REQUEST_SIZE", "0")], memory()),
        (&[("FOODS_TABLE_NAME", " ")], memory()),
        (&[("FOODS_UPDATE_EMPTINESS", "strict")], memory()),
        (&[], Some("mongodb://localhost:27017/foods".to_string())),
    ];

    for (pairs, connection) in cases {
        assert!(
            matches!(
                Config::from_source(env(pairs), connection),
                Err(ConfigError::ValidationError { .. })
            ),
            "expected validation error for {:?}",
            pairs
        );
    }
}

#[test]
fn test_unparseable_value_is_a_load_error() {
    let result = Config::from_source(env(&[("FOODS_PORT", "not-a-port")]), memory());
    assert!(matches!(result, Err(ConfigError::LoadError { .. })));
}

#[test]
fn test_store_connection_parsing() {
    assert_eq!(
        StoreConnection::parse("memory://").unwrap(),
        StoreConnection::Memory
    );
    assert_eq!(
        StoreConnection::parse("MEMORY://foods").unwrap(),
        StoreConnection::Memory
    );
    assert_eq!(
        StoreConnection::parse("https://dynamodb.us-east-1.amazonaws.com/").unwrap(),
        StoreConnection::DynamoDb {
            endpoint: "https://dynamodb.us-east-1.amazonaws.com".to_string()
        }
    );
    assert!(StoreConnection::parse("http://").is_err());
    assert!(StoreConnection::parse("localhost:8000").is_err());
}

#[test]
fn test_in_memory_database_config() {
    let database = DatabaseConfig::in_memory();

    assert_eq!(database.store_connection().unwrap(), StoreConnection::Memory);
    assert_eq!(database.table_name, default_table_name());
}

#[test]
fn test_config_error_display() {
    let error = ConfigError::ValidationError {
        message: "Invalid configuration".to_string(),
    };
    assert_eq!(error.to_string(), "Validation error: Invalid configuration");

    let error = ConfigError::MissingEnvironmentVariable {
        name: "DB_CONNECTION".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Environment variable missing: DB_CONNECTION"
    );
}
