//! Deciding what a reconciliation pass writes and what it answers.
//!
//! [`plan`] is pure: it looks at the stored record, the stored servers and
//! the fresh snapshot and returns the writes plus the response. The engine
//! applies the writes.

use chrono::{DateTime, Utc};

use crate::config::ServersChangedMode;
use crate::models::{DomainRecord, ServerRecord};
use crate::reconcile::diff::{diff_servers, ServerDiff};
use crate::reconcile::gate::{self, Gate};
use crate::reconcile::ReconcilePolicy;

/// How a lookup was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First lookup; domain and servers inserted
    Created,
    /// Served from the store without writing
    Cached,
    /// Stale record re-fetched and reconciled
    Refreshed { changed: bool },
}

/// The write applied to the domain row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainWrite {
    None,
    /// Insert the row and all of its servers
    Insert(DomainRecord),
    /// Overwrite the mutable fields, persisting `servers_changed` as given
    Update {
        record: DomainRecord,
        servers_changed: bool,
    },
    /// Advance `last_updated` only
    Touch(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub outcome: Outcome,
    pub servers: ServerDiff,
    pub domain: DomainWrite,
    pub response: DomainRecord,
}

impl ReconcilePlan {
    /// Whether applying the plan touches the store at all.
    #[cfg(test)]
    pub fn writes(&self) -> bool {
        !self.servers.is_empty() || self.domain != DomainWrite::None
    }
}

/// Plans a pass for `fresh` against what is stored.
///
/// `fresh.ssl_grade` must already be the worst grade of `fresh.servers`.
pub fn plan(
    existing: Option<&DomainRecord>,
    existing_servers: &[ServerRecord],
    fresh: &DomainRecord,
    now: DateTime<Utc>,
    policy: &ReconcilePolicy,
) -> ReconcilePlan {
    match (gate::check(existing, now, policy.staleness_window), existing) {
        (Gate::FirstLookup, _) | (_, None) => plan_insert(fresh),
        (Gate::Fresh, Some(stored)) => plan_cached(stored, existing_servers),
        (Gate::Stale, Some(stored)) => plan_refresh(stored, existing_servers, fresh, now, policy),
    }
}

fn plan_insert(fresh: &DomainRecord) -> ReconcilePlan {
    let record = DomainRecord {
        servers_changed: false,
        previous_ssl_grade: String::new(),
        is_down: false,
        ..fresh.clone()
    };
    ReconcilePlan {
        outcome: Outcome::Created,
        servers: ServerDiff::default(),
        domain: DomainWrite::Insert(record.clone()),
        response: record,
    }
}

fn plan_cached(stored: &DomainRecord, stored_servers: &[ServerRecord]) -> ReconcilePlan {
    ReconcilePlan {
        outcome: Outcome::Cached,
        servers: ServerDiff::default(),
        domain: DomainWrite::None,
        response: DomainRecord {
            servers_changed: false,
            is_down: false,
            servers: stored_servers.to_vec(),
            ..stored.clone()
        },
    }
}

fn plan_refresh(
    stored: &DomainRecord,
    stored_servers: &[ServerRecord],
    fresh: &DomainRecord,
    now: DateTime<Utc>,
    policy: &ReconcilePolicy,
) -> ReconcilePlan {
    let servers = diff_servers(stored_servers, &fresh.servers, policy.owner_comparison);
    let changed = !servers.is_empty();
    let fields_changed = stored.ssl_grade != fresh.ssl_grade
        || stored.logo != fresh.logo
        || stored.title != fresh.title;

    let domain = if changed || fields_changed {
        let servers_changed = match policy.servers_changed_mode {
            ServersChangedMode::Always => true,
            ServersChangedMode::Computed => changed,
        };
        DomainWrite::Update {
            record: DomainRecord {
                servers_changed,
                previous_ssl_grade: stored.ssl_grade.clone(),
                last_updated: now,
                servers: Vec::new(),
                ..fresh.clone()
            },
            servers_changed,
        }
    } else {
        DomainWrite::Touch(now)
    };

    ReconcilePlan {
        outcome: Outcome::Refreshed { changed },
        servers,
        domain,
        response: DomainRecord {
            servers_changed: changed,
            previous_ssl_grade: stored.ssl_grade.clone(),
            is_down: false,
            ..fresh.clone()
        },
    }
}
