//! Server row persistence.
//!
//! Rows are keyed by `(domain, address)`.

use sqlx::{Row, SqliteConnection};

use crate::error_handling::DatabaseError;
use crate::models::ServerRecord;

/// Loads the servers of `domain` in the order they were inserted.
///
/// A domain with no stored servers (or no row at all) yields an empty list.
pub async fn load_servers(
    conn: &mut SqliteConnection,
    domain: &str,
) -> Result<Vec<ServerRecord>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT address, ssl_grade, country, owner
         FROM servers WHERE domain = ?
         ORDER BY rowid",
    )
    .bind(domain)
    .fetch_all(&mut *conn)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(rows
        .iter()
        .map(|row| ServerRecord {
            address: row.get("address"),
            ssl_grade: row.get("ssl_grade"),
            country: row.get("country"),
            owner: row.get("owner"),
        })
        .collect())
}

pub async fn insert_server(
    conn: &mut SqliteConnection,
    server: &ServerRecord,
    domain: &str,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO servers (domain, address, ssl_grade, country, owner)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(domain)
    .bind(&server.address)
    .bind(&server.ssl_grade)
    .bind(&server.country)
    .bind(&server.owner)
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Overwrites grade, country and owner of the server at `server.address`.
pub async fn update_server(
    conn: &mut SqliteConnection,
    server: &ServerRecord,
    domain: &str,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE servers SET ssl_grade = ?, country = ?, owner = ?
         WHERE domain = ? AND address = ?",
    )
    .bind(&server.ssl_grade)
    .bind(&server.country)
    .bind(&server.owner)
    .bind(domain)
    .bind(&server.address)
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

pub async fn delete_server(
    conn: &mut SqliteConnection,
    address: &str,
    domain: &str,
) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM servers WHERE domain = ? AND address = ?")
        .bind(domain)
        .bind(address)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::SqlError)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::insert_domain;
    use crate::storage::test_helpers::{create_test_domain, create_test_pool, test_time};

    #[tokio::test]
    async fn test_load_servers_empty_for_unknown_domain() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let servers = load_servers(&mut conn, "nobody.example").await.expect("load");
        assert!(servers.is_empty());
    }

    #[tokio::test]
    async fn test_insert_update_delete_server() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert_domain(&mut conn, &create_test_domain("example.com", test_time(0)))
            .await
            .expect("insert domain");

        let added = ServerRecord::new("198.51.100.7", "B", "Germany", "AS3320 Deutsche Telekom");
        insert_server(&mut conn, &added, "example.com")
            .await
            .expect("insert server");

        let changed = ServerRecord::new("198.51.100.7", "A", "Germany", "AS3320 Deutsche Telekom");
        update_server(&mut conn, &changed, "example.com")
            .await
            .expect("update server");

        let servers = load_servers(&mut conn, "example.com").await.expect("load");
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1], changed);

        delete_server(&mut conn, "198.51.100.7", "example.com")
            .await
            .expect("delete server");
        let servers = load_servers(&mut conn, "example.com").await.expect("load");
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].address, "192.0.2.1");
    }

    #[tokio::test]
    async fn test_same_address_under_two_domains() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert_domain(&mut conn, &create_test_domain("a.example", test_time(0)))
            .await
            .expect("insert a");
        insert_domain(&mut conn, &create_test_domain("b.example", test_time(0)))
            .await
            .expect("insert b");

        delete_server(&mut conn, "192.0.2.1", "a.example")
            .await
            .expect("delete");

        assert!(load_servers(&mut conn, "a.example").await.unwrap().is_empty());
        assert_eq!(load_servers(&mut conn, "b.example").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_server_requires_domain_row() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let orphan = ServerRecord::new("192.0.2.9", "A", "", "");
        let result = insert_server(&mut conn, &orphan, "ghost.example").await;
        assert!(matches!(result, Err(DatabaseError::SqlError(_))));
    }
}
