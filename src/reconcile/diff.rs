//! Server set diffing.

use std::collections::{HashMap, HashSet};

use crate::config::OwnerComparison;
use crate::models::ServerRecord;

/// Writes needed to turn the stored server set into the fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerDiff {
    /// Fresh values for stored addresses whose details changed
    pub updates: Vec<ServerRecord>,
    /// Stored addresses missing from the fresh snapshot
    pub deletes: Vec<String>,
    /// Fresh servers with addresses not stored yet
    pub inserts: Vec<ServerRecord>,
}

impl ServerDiff {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletes.is_empty() && self.inserts.is_empty()
    }
}

/// Whether `fresh` differs from `stored` in grade, country or owner.
pub fn server_changed(stored: &ServerRecord, fresh: &ServerRecord, owner: OwnerComparison) -> bool {
    let owner_differs = match owner {
        OwnerComparison::Owner => stored.owner != fresh.owner,
        OwnerComparison::Country => stored.owner != fresh.country,
    };
    stored.country != fresh.country || owner_differs || stored.ssl_grade != fresh.ssl_grade
}

/// Matches servers by address.
///
/// Updates and deletes follow the stored order, inserts the fresh order.
/// Unchanged servers produce nothing.
pub fn diff_servers(
    stored: &[ServerRecord],
    fresh: &[ServerRecord],
    owner: OwnerComparison,
) -> ServerDiff {
    let fresh_by_address: HashMap<&str, &ServerRecord> =
        fresh.iter().map(|s| (s.address.as_str(), s)).collect();
    let stored_addresses: HashSet<&str> = stored.iter().map(|s| s.address.as_str()).collect();

    let mut diff = ServerDiff::default();
    for current in stored {
        match fresh_by_address.get(current.address.as_str()) {
            Some(&next) if server_changed(current, next, owner) => diff.updates.push(next.clone()),
            Some(_) => {}
            None => diff.deletes.push(current.address.clone()),
        }
    }
    diff.inserts = fresh
        .iter()
        .filter(|s| !stored_addresses.contains(s.address.as_str()))
        .cloned()
        .collect();
    diff
}
