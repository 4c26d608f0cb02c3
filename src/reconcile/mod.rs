//! Reconciliation of freshly fetched snapshots against stored domains.
//!
//! A lookup goes through three steps:
//! - **Gate**: a stored record younger than the staleness window is served as is
//! - **Diff**: stored and fresh servers are matched by address into updates,
//!   deletes and inserts
//! - **Apply**: the writes run in one transaction while the domain is locked
//!
//! [`plan`] decides, [`Reconciler`] executes.

mod diff;
mod engine;
mod gate;
mod grade;
mod plan;

use chrono::Duration;

use crate::config::{
    Config, OwnerComparison, ServersChangedMode, MAX_STALENESS_MINUTES, MIN_STALENESS_MINUTES,
    STALENESS_WINDOW_MINUTES,
};

pub use diff::{diff_servers, server_changed, ServerDiff};
pub use engine::{apply_plan, Reconciled, Reconciler};
pub use gate::{is_stale, Gate};
pub use grade::{build_fresh_record, compute_domain_grade, sort_by_grade};
pub use plan::{plan, DomainWrite, Outcome, ReconcilePlan};

/// Tunables of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Records older than this are re-fetched
    pub staleness_window: Duration,
    pub owner_comparison: OwnerComparison,
    pub servers_changed_mode: ServersChangedMode,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            staleness_window: Duration::minutes(STALENESS_WINDOW_MINUTES),
            owner_comparison: OwnerComparison::default(),
            servers_changed_mode: ServersChangedMode::default(),
        }
    }
}

impl From<&Config> for ReconcilePolicy {
    fn from(config: &Config) -> Self {
        Self {
            staleness_window: Duration::minutes(
                config
                    .staleness_minutes
                    .clamp(MIN_STALENESS_MINUTES, MAX_STALENESS_MINUTES),
            ),
            owner_comparison: config.owner_comparison,
            servers_changed_mode: config.servers_changed_mode,
        }
    }
}
