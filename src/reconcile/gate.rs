//! Staleness gating.

use chrono::{DateTime, Duration, Utc};

use crate::models::DomainRecord;

/// What a lookup should do given what is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Never looked up before: fetch and insert.
    FirstLookup,
    /// Stored record is recent enough: serve it as is.
    Fresh,
    /// Stored record is older than the window: fetch and reconcile.
    Stale,
}

/// `true` once strictly more than `window` has passed since `last_updated`.
pub fn is_stale(last_updated: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(last_updated) > window
}

pub fn check(existing: Option<&DomainRecord>, now: DateTime<Utc>, window: Duration) -> Gate {
    match existing {
        None => Gate::FirstLookup,
        Some(record) if is_stale(record.last_updated, now, window) => Gate::Stale,
        Some(_) => Gate::Fresh,
    }
}
