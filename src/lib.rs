//! domain_grade library: TLS grades and hosting details for domains
//!
//! Looks up a domain's TLS assessment, geolocates each of its servers, scrapes
//! the home page for title and favicon, and keeps the result in SQLite. Stored
//! results are served for up to an hour; after that a lookup re-fetches and
//! reconciles the fresh snapshot with what is stored, recording whether the
//! server set changed and what the previous grade was.
//!
//! # Example
//!
//! ```no_run
//! use domain_grade::{run_server, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     port: 8080,
//!     ..Default::default()
//! };
//!
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod api;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod parse;
pub mod reconcile;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, OwnerComparison, ServersChangedMode};
pub use models::{DomainRecord, ServerRecord};
pub use reconcile::{Outcome, Reconciled, ReconcilePolicy, Reconciler};
pub use run::{build_state, run_server};
pub use storage::{run_migrations, DomainStore};

// Internal run module (wires storage, data sources and the API together)
mod run {
    use anyhow::{Context, Result};
    use log::info;

    use crate::api::{start_api_server, ApiState};
    use crate::config::Config;
    use crate::fetch::FetchContext;
    use crate::initialization::init_client;
    use crate::reconcile::{ReconcilePolicy, Reconciler};
    use crate::storage::{init_db_pool_with_path, run_migrations, DomainStore};

    /// Opens the database, applies migrations and builds the API state.
    ///
    /// # Errors
    ///
    /// Fails if the database cannot be opened or migrated, or the HTTP
    /// client cannot be built.
    pub async fn build_state(config: &Config) -> Result<ApiState> {
        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let client = init_client(config).context("Failed to initialize HTTP client")?;

        let policy = ReconcilePolicy::from(config);
        info!(
            "Staleness window {} minutes, owner comparison {:?}, servers_changed {:?}",
            policy.staleness_window.num_minutes(),
            policy.owner_comparison,
            policy.servers_changed_mode
        );

        let reconciler = Reconciler::new(DomainStore::new(pool), policy);
        Ok(ApiState::new(reconciler, FetchContext::new(client, config)))
    }

    /// Runs the API server with the provided configuration until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails on any startup error from [`build_state`] or if the listener
    /// cannot be bound.
    pub async fn run_server(config: Config) -> Result<()> {
        let state = build_state(&config).await?;
        let pool = state.reconciler.store().pool().clone();

        start_api_server(&config.bind, config.port, state).await?;

        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&pool)
            .await
        {
            log::warn!(
                "Failed to checkpoint WAL file (this is non-critical): {}",
                e
            );
        }
        pool.close().await;
        info!("Database closed");
        Ok(())
    }
}
