// crates/preimage-store-postgres/tests/postgres_store.rs
// ============================================================================
// Module: Postgres Store Tests
// Description: Unit tests for Postgres store configuration and construction.
// Purpose: Validate error handling without a live database.
// ============================================================================

//! Postgres store unit tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use preimage_store_postgres::PostgresStore;
use preimage_store_postgres::PostgresStoreConfig;

#[test]
fn postgres_store_default_config_is_valid_shape() {
    let config = PostgresStoreConfig::default();
    assert!(!config.connection.is_empty());
    assert!(config.max_connections > 0);
    assert!(config.connect_timeout_ms > 0);
    assert!(config.statement_timeout_ms > 0);
}

#[test]
fn postgres_store_invalid_connection_string_fails() {
    let config = PostgresStoreConfig {
        connection: "not-a-url".to_string(),
        max_connections: 1,
        connect_timeout_ms: 1,
        statement_timeout_ms: 1,
    };
    let result = PostgresStore::new(&config);
    assert!(result.is_err());
}

#[test]
fn postgres_store_config_serde_roundtrip() {
    let original = PostgresStoreConfig::default();
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: PostgresStoreConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(original.connection, restored.connection);
    assert_eq!(original.max_connections, restored.max_connections);
    assert_eq!(original.connect_timeout_ms, restored.connect_timeout_ms);
    assert_eq!(original.statement_timeout_ms, restored.statement_timeout_ms);
}

#[test]
fn postgres_store_config_fills_missing_fields() {
    let partial: PostgresStoreConfig =
        serde_json::from_str("{\"connection\":\"postgres://db/preimage\"}").expect("deserialize");
    assert_eq!(partial.connection, "postgres://db/preimage");
    assert_eq!(partial.max_connections, PostgresStoreConfig::default().max_connections);
}
