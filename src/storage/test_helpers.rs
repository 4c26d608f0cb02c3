//! Shared test helpers for storage and reconciliation tests.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::models::{DomainRecord, ServerRecord};
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A fixed instant `minutes` after 2024-01-01 00:00:00 UTC.
pub fn test_time(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// A domain graded `A` with a single server at 192.0.2.1.
pub fn create_test_domain(name: &str, last_updated: DateTime<Utc>) -> DomainRecord {
    DomainRecord {
        domain: name.to_string(),
        servers_changed: false,
        ssl_grade: "A".to_string(),
        previous_ssl_grade: String::new(),
        logo: "/favicon.ico".to_string(),
        title: "Example Domain".to_string(),
        is_down: false,
        last_updated,
        servers: vec![ServerRecord::new(
            "192.0.2.1",
            "A",
            "United States",
            "AS15133 Edgecast Inc.",
        )],
    }
}
