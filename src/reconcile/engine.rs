//! Running reconciliation passes against the store.

use std::future::Future;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::error_handling::{DatabaseError, ReconcileError};
use crate::models::DomainRecord;
use crate::reconcile::gate::{self, Gate};
use crate::reconcile::plan::{plan, DomainWrite, Outcome, ReconcilePlan};
use crate::reconcile::ReconcilePolicy;
use crate::storage::{
    delete_server, insert_domain, insert_server, load_domain, load_servers, touch_domain,
    update_domain, update_server, DomainStore,
};

/// Result of a lookup: how it was answered and the payload to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: Outcome,
    pub record: DomainRecord,
}

/// Reconciles fresh snapshots against the store, one domain at a time.
#[derive(Clone)]
pub struct Reconciler {
    store: DomainStore,
    policy: ReconcilePolicy,
}

impl Reconciler {
    pub fn new(store: DomainStore, policy: ReconcilePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    /// Reconciles an already fetched snapshot.
    ///
    /// Loads, plans and writes inside one transaction while holding the
    /// domain's lock. Any failed write rolls the whole pass back.
    pub async fn reconcile(
        &self,
        fresh: DomainRecord,
        now: DateTime<Utc>,
    ) -> Result<Reconciled, ReconcileError> {
        let _guard = self.store.lock(&fresh.domain).await;
        let mut tx = self.store.begin().await?;

        let existing = load_domain(&mut tx, &fresh.domain).await?;
        let existing_servers = load_servers(&mut tx, &fresh.domain).await?;
        let plan = plan(
            existing.as_ref(),
            &existing_servers,
            &fresh,
            now,
            &self.policy,
        );
        commit_plan(tx, &fresh.domain, &plan).await?;

        log_outcome(&fresh.domain, &plan);
        Ok(Reconciled {
            outcome: plan.outcome,
            record: plan.response,
        })
    }

    /// Answers a lookup of `domain`, calling `fetch` only when needed.
    ///
    /// A stored record inside the staleness window is returned without
    /// contacting any data source. Otherwise `fetch` produces the fresh
    /// snapshot and the pass proceeds as in [`Reconciler::reconcile`]. The
    /// domain stays locked throughout, so concurrent lookups of one domain
    /// fetch once and the rest are served from the store.
    pub async fn lookup<F, Fut>(
        &self,
        domain: &str,
        now: DateTime<Utc>,
        fetch: F,
    ) -> Result<Reconciled, ReconcileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DomainRecord, ReconcileError>>,
    {
        let _guard = self.store.lock(domain).await;

        let mut conn = self
            .store
            .pool()
            .acquire()
            .await
            .map_err(DatabaseError::SqlError)?;
        let existing = load_domain(&mut conn, domain).await?;

        if let Some(stored) = existing.as_ref() {
            if gate::check(Some(stored), now, self.policy.staleness_window) == Gate::Fresh {
                let servers = load_servers(&mut conn, domain).await?;
                let plan = plan(Some(stored), &servers, stored, now, &self.policy);
                log_outcome(domain, &plan);
                return Ok(Reconciled {
                    outcome: plan.outcome,
                    record: plan.response,
                });
            }
        }
        drop(conn);

        let fresh = fetch().await?;

        let mut tx = self.store.begin().await?;
        let existing_servers = load_servers(&mut tx, domain).await?;
        let plan = plan(
            existing.as_ref(),
            &existing_servers,
            &fresh,
            now,
            &self.policy,
        );
        commit_plan(tx, domain, &plan).await?;

        log_outcome(domain, &plan);
        Ok(Reconciled {
            outcome: plan.outcome,
            record: plan.response,
        })
    }
}

/// Applies `plan` inside `tx` and commits, rolling back if any write fails.
async fn commit_plan(
    mut tx: Transaction<'static, Sqlite>,
    domain: &str,
    plan: &ReconcilePlan,
) -> Result<(), DatabaseError> {
    if let Err(e) = apply_plan(&mut tx, domain, plan).await {
        error!("Reconciliation of {} failed, rolling back: {}", domain, e);
        if let Err(rollback) = tx.rollback().await {
            warn!("Rollback for {} failed: {}", domain, rollback);
        }
        return Err(e);
    }
    tx.commit().await.map_err(DatabaseError::SqlError)
}

/// Executes the writes of `plan` on `conn`.
pub async fn apply_plan(
    conn: &mut SqliteConnection,
    domain: &str,
    plan: &ReconcilePlan,
) -> Result<(), DatabaseError> {
    for server in &plan.servers.updates {
        update_server(conn, server, domain).await?;
    }
    for address in &plan.servers.deletes {
        debug!("Deleting server {} of {}", address, domain);
        delete_server(conn, address, domain).await?;
    }
    for server in &plan.servers.inserts {
        insert_server(conn, server, domain).await?;
    }

    match &plan.domain {
        DomainWrite::None => {}
        DomainWrite::Insert(record) => insert_domain(conn, record).await?,
        DomainWrite::Update {
            record,
            servers_changed,
        } => update_domain(conn, record, *servers_changed).await?,
        DomainWrite::Touch(now) => touch_domain(conn, domain, *now).await?,
    }
    Ok(())
}

fn log_outcome(domain: &str, plan: &ReconcilePlan) {
    match plan.outcome {
        Outcome::Created => info!(
            "Stored new domain {} with {} servers (grade {})",
            domain,
            plan.response.servers.len(),
            plan.response.ssl_grade
        ),
        Outcome::Cached => debug!("Serving stored record for {}", domain),
        Outcome::Refreshed { changed } => info!(
            "Refreshed {} (servers changed: {}, {} updated, {} deleted, {} inserted)",
            domain,
            changed,
            plan.servers.updates.len(),
            plan.servers.deletes.len(),
            plan.servers.inserts.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Duration;
    use sqlx::SqlitePool;

    use crate::error_handling::SourceError;
    use crate::models::ServerRecord;
    use crate::storage::test_helpers::{create_test_domain, create_test_pool, test_time};
    use crate::storage::{init_db_pool_with_path, run_migrations};

    async fn reconciler() -> (Reconciler, SqlitePool) {
        let pool = create_test_pool().await;
        let store = DomainStore::new(pool.clone());
        (Reconciler::new(store, ReconcilePolicy::default()), pool)
    }

    async fn stored(pool: &SqlitePool, domain: &str) -> Option<DomainRecord> {
        let mut conn = pool.acquire().await.unwrap();
        let mut record = load_domain(&mut conn, domain).await.unwrap()?;
        record.servers = load_servers(&mut conn, domain).await.unwrap();
        Some(record)
    }

    async fn row_counts(pool: &SqlitePool) -> (i64, i64) {
        let domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
            .fetch_one(pool)
            .await
            .unwrap();
        let servers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM servers")
            .fetch_one(pool)
            .await
            .unwrap();
        (domains, servers)
    }

    fn server(address: &str, grade: &str) -> ServerRecord {
        ServerRecord::new(address, grade, "United States", "AS15133 Edgecast Inc.")
    }

    #[tokio::test]
    async fn test_first_reconcile_inserts_domain_and_servers() {
        let (reconciler, pool) = reconciler().await;
        let mut fresh = create_test_domain("example.com", test_time(0));
        fresh.servers.push(server("192.0.2.2", "B"));
        fresh.ssl_grade = "B".to_string();

        let result = reconciler.reconcile(fresh.clone(), test_time(0)).await.unwrap();

        assert_eq!(result.outcome, Outcome::Created);
        assert!(!result.record.servers_changed);
        assert_eq!(result.record.previous_ssl_grade, "");
        assert_eq!(row_counts(&pool).await, (1, 2));
        assert_eq!(stored(&pool, "example.com").await.unwrap(), result.record);
    }

    #[tokio::test]
    async fn test_reconcile_within_window_does_not_write() {
        let (reconciler, pool) = reconciler().await;
        let original = create_test_domain("example.com", test_time(0));
        reconciler.reconcile(original.clone(), test_time(0)).await.unwrap();

        let mut fresh = create_test_domain("example.com", test_time(60));
        fresh.servers = vec![server("203.0.113.5", "F")];
        fresh.ssl_grade = "F".to_string();
        let result = reconciler.reconcile(fresh, test_time(60)).await.unwrap();

        assert_eq!(result.outcome, Outcome::Cached);
        assert_eq!(result.record, original);
        assert_eq!(stored(&pool, "example.com").await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_stale_reconcile_applies_diff() {
        let (reconciler, pool) = reconciler().await;
        let mut original = create_test_domain("example.com", test_time(0));
        original.servers = vec![server("A", "X"), server("B", "Y")];
        original.ssl_grade = "Y".to_string();
        reconciler.reconcile(original, test_time(0)).await.unwrap();

        let mut fresh = create_test_domain("example.com", test_time(61));
        fresh.servers = vec![server("A", "X"), server("C", "Z")];
        fresh.ssl_grade = "Z".to_string();
        let result = reconciler.reconcile(fresh, test_time(61)).await.unwrap();

        assert_eq!(result.outcome, Outcome::Refreshed { changed: true });
        assert!(result.record.servers_changed);
        assert_eq!(result.record.previous_ssl_grade, "Y");

        let after = stored(&pool, "example.com").await.unwrap();
        let addresses: Vec<_> = after.servers.iter().map(|s| s.address.as_str()).collect();
        assert_eq!(addresses, vec!["A", "C"]);
        assert_eq!(after.ssl_grade, "Z");
        assert_eq!(after.previous_ssl_grade, "Y");
        assert!(after.servers_changed);
        assert_eq!(after.last_updated, test_time(61));
    }

    #[tokio::test]
    async fn test_stale_grade_change_records_previous_grade() {
        let (reconciler, pool) = reconciler().await;
        reconciler
            .reconcile(create_test_domain("example.com", test_time(0)), test_time(0))
            .await
            .unwrap();

        let mut fresh = create_test_domain("example.com", test_time(75));
        fresh.ssl_grade = "B".to_string();
        let result = reconciler.reconcile(fresh, test_time(75)).await.unwrap();

        assert!(!result.record.servers_changed);
        let after = stored(&pool, "example.com").await.unwrap();
        assert_eq!(after.ssl_grade, "B");
        assert_eq!(after.previous_ssl_grade, "A");
    }

    #[tokio::test]
    async fn test_stale_identical_snapshot_advances_timestamp_only() {
        let (reconciler, pool) = reconciler().await;
        let original = create_test_domain("example.com", test_time(0));
        reconciler.reconcile(original.clone(), test_time(0)).await.unwrap();

        let result = reconciler
            .reconcile(create_test_domain("example.com", test_time(61)), test_time(61))
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Refreshed { changed: false });
        assert!(!result.record.servers_changed);
        let after = stored(&pool, "example.com").await.unwrap();
        assert_eq!(after.last_updated, test_time(61));
        assert_eq!(
            DomainRecord {
                last_updated: original.last_updated,
                ..after
            },
            original
        );
    }

    #[tokio::test]
    async fn test_lookup_within_window_skips_fetch() {
        let (reconciler, _pool) = reconciler().await;
        reconciler
            .reconcile(create_test_domain("example.com", test_time(0)), test_time(0))
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);
        let result = reconciler
            .lookup("example.com", test_time(30), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(create_test_domain("example.com", test_time(30)))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.outcome, Outcome::Cached);
        assert_eq!(result.record.servers.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_fetches_when_stale() {
        let (reconciler, _pool) = reconciler().await;
        reconciler
            .reconcile(create_test_domain("example.com", test_time(0)), test_time(0))
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);
        let now = test_time(0) + Duration::minutes(61);
        let result = reconciler
            .lookup("example.com", now, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(create_test_domain("example.com", now))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.outcome, Outcome::Refreshed { changed: false });
    }

    #[tokio::test]
    async fn test_lookup_fetch_error_writes_nothing() {
        let (reconciler, pool) = reconciler().await;

        let result = reconciler
            .lookup("example.com", test_time(0), || async {
                Err(ReconcileError::Source(SourceError::NoEndpoints {
                    domain: "example.com".to_string(),
                }))
            })
            .await;

        assert!(matches!(result, Err(ReconcileError::Source(_))));
        assert_eq!(row_counts(&pool).await, (0, 0));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_pass() {
        let (reconciler, pool) = reconciler().await;
        let mut original = create_test_domain("example.com", test_time(0));
        original.servers = vec![server("A", "A"), server("B", "A")];
        reconciler.reconcile(original.clone(), test_time(0)).await.unwrap();

        // B is deleted first, then the duplicate insert of C violates the key
        let mut fresh = create_test_domain("example.com", test_time(61));
        fresh.servers = vec![server("A", "A"), server("C", "B"), server("C", "C")];
        fresh.ssl_grade = "C".to_string();
        let result = reconciler.reconcile(fresh, test_time(61)).await;

        assert!(matches!(result, Err(ReconcileError::Database(_))));
        assert_eq!(stored(&pool, "example.com").await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_concurrent_first_lookups_insert_once() {
        let (reconciler, pool) = reconciler().await;
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let reconciler = reconciler.clone();
            let fetches = Arc::clone(&fetches);
            handles.push(tokio::spawn(async move {
                reconciler
                    .lookup("example.com", test_time(0), || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(create_test_domain("example.com", test_time(0)))
                    })
                    .await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap().outcome);
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            outcomes.iter().filter(|o| **o == Outcome::Created).count(),
            1
        );
        assert_eq!(row_counts(&pool).await, (1, 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_of_distinct_domains_all_commit() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let pool = init_db_pool_with_path(&dir.path().join("grades.db"))
            .await
            .expect("Failed to open database");
        run_migrations(&pool).await.expect("Failed to run migrations");
        let reconciler = Reconciler::new(DomainStore::new(pool.clone()), ReconcilePolicy::default());

        let mut handles = Vec::new();
        for i in 0..16 {
            let reconciler = reconciler.clone();
            handles.push(tokio::spawn(async move {
                let domain = format!("d{}.example.com", i);
                let fresh = create_test_domain(&domain, test_time(0));
                reconciler
                    .lookup(&domain, test_time(0), || async move {
                        tokio::task::yield_now().await;
                        Ok(fresh)
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "lookup failed: {:?}", result.err());
            assert_eq!(result.unwrap().outcome, Outcome::Created);
        }
        assert_eq!(row_counts(&pool).await, (16, 16));
    }
}
