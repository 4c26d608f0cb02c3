//! Domain row persistence.
//!
//! Every function takes a `SqliteConnection` so it can run on a pooled
//! connection or inside the transaction of a reconciliation pass.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Row, SqliteConnection};

use crate::error_handling::DatabaseError;
use crate::models::DomainRecord;
use crate::storage::servers::insert_server;

fn row_to_domain(row: &SqliteRow) -> Result<DomainRecord, DatabaseError> {
    let domain: String = row.get("domain");
    let last_updated_ms: i64 = row.get("last_updated_ms");
    let last_updated =
        DateTime::<Utc>::from_timestamp_millis(last_updated_ms).ok_or_else(|| {
            DatabaseError::CorruptRow {
                domain: domain.clone(),
                reason: format!("last_updated_ms {} out of range", last_updated_ms),
            }
        })?;

    Ok(DomainRecord {
        servers_changed: row.get("servers_changed"),
        ssl_grade: row.get("ssl_grade"),
        previous_ssl_grade: row.get("previous_ssl_grade"),
        logo: row.get("logo"),
        title: row.get("title"),
        is_down: row.get("is_down"),
        last_updated,
        servers: Vec::new(),
        domain,
    })
}

/// Loads the domain row for `name`.
///
/// Not found is `Ok(None)`. The returned record has an empty `servers` list;
/// use [`crate::storage::load_servers`] for those.
pub async fn load_domain(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<DomainRecord>, DatabaseError> {
    let row = sqlx::query(
        "SELECT domain, servers_changed, ssl_grade, previous_ssl_grade, logo, title,
                is_down, last_updated_ms
         FROM domains WHERE domain = ?",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(DatabaseError::SqlError)?;

    row.as_ref().map(row_to_domain).transpose()
}

/// Inserts a domain together with all of its servers.
///
/// Runs in its own transaction (a savepoint when `conn` is already inside
/// one), so either the domain and every server land or nothing does.
pub async fn insert_domain(
    conn: &mut SqliteConnection,
    record: &DomainRecord,
) -> Result<(), DatabaseError> {
    let mut tx = conn.begin().await.map_err(DatabaseError::SqlError)?;

    if let Err(e) = insert_domain_rows(&mut tx, record).await {
        if let Err(rollback) = tx.rollback().await {
            log::warn!("Rollback of insert for {} failed: {}", record.domain, rollback);
        }
        return Err(e);
    }

    tx.commit().await.map_err(DatabaseError::SqlError)?;
    Ok(())
}

async fn insert_domain_rows(
    conn: &mut SqliteConnection,
    record: &DomainRecord,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO domains (
            domain, servers_changed, ssl_grade, previous_ssl_grade, logo, title,
            is_down, last_updated_ms
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.domain)
    .bind(record.servers_changed)
    .bind(&record.ssl_grade)
    .bind(&record.previous_ssl_grade)
    .bind(&record.logo)
    .bind(&record.title)
    .bind(record.is_down)
    .bind(record.last_updated.timestamp_millis())
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::SqlError)?;

    for server in &record.servers {
        insert_server(conn, server, &record.domain).await?;
    }
    Ok(())
}

/// Updates the mutable fields of an existing domain row.
///
/// `servers_changed` is passed separately because what gets persisted is a
/// policy decision of the caller, not necessarily `record.servers_changed`.
pub async fn update_domain(
    conn: &mut SqliteConnection,
    record: &DomainRecord,
    servers_changed: bool,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE domains SET
            servers_changed = ?,
            ssl_grade = ?,
            previous_ssl_grade = ?,
            logo = ?,
            title = ?,
            is_down = ?,
            last_updated_ms = ?
         WHERE domain = ?",
    )
    .bind(servers_changed)
    .bind(&record.ssl_grade)
    .bind(&record.previous_ssl_grade)
    .bind(&record.logo)
    .bind(&record.title)
    .bind(record.is_down)
    .bind(record.last_updated.timestamp_millis())
    .bind(&record.domain)
    .execute(&mut *conn)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Advances `last_updated` without touching anything else.
pub async fn touch_domain(
    conn: &mut SqliteConnection,
    name: &str,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE domains SET last_updated_ms = ? WHERE domain = ?")
        .bind(now.timestamp_millis())
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Names of every domain ever looked up, alphabetically.
pub async fn list_domain_names(conn: &mut SqliteConnection) -> Result<Vec<String>, DatabaseError> {
    sqlx::query_scalar("SELECT domain FROM domains ORDER BY domain")
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::SqlError)
}
