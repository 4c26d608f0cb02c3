//! Worst-grade computation and assembly of a fresh domain snapshot.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::warn;

use crate::error_handling::ReconcileError;
use crate::models::{DomainRecord, PageMetadata, ServerRecord};

/// Sorts servers ascending by grade string; ties keep their original order.
///
/// Grades compare as plain strings (`A < A+ < A- < B < ... < F < T`), so the
/// letter grades put the worst one last.
pub fn sort_by_grade(servers: &mut [ServerRecord]) {
    servers.sort_by(|a, b| a.ssl_grade.cmp(&b.ssl_grade));
}

/// The worst grade among `servers`: the last one after sorting ascending.
///
/// # Errors
///
/// `ReconcileError::EmptyServerList` when `servers` is empty. Callers treat a
/// domain without endpoints as a data source failure before getting here.
pub fn compute_domain_grade(servers: &[ServerRecord]) -> Result<String, ReconcileError> {
    servers
        .iter()
        .map(|s| &s.ssl_grade)
        .max()
        .cloned()
        .ok_or(ReconcileError::EmptyServerList)
}

/// Builds the fresh record a reconciliation pass compares against the store.
///
/// Servers are de-duplicated by address (first wins), sorted by grade, and
/// the domain grade is the worst of them. `last_updated` is `now`.
pub fn build_fresh_record(
    domain: &str,
    servers: Vec<ServerRecord>,
    metadata: PageMetadata,
    now: DateTime<Utc>,
) -> Result<DomainRecord, ReconcileError> {
    let mut seen = HashSet::new();
    let mut servers: Vec<ServerRecord> = servers
        .into_iter()
        .filter(|s| {
            let first = seen.insert(s.address.clone());
            if !first {
                warn!("Duplicate endpoint {} for {}, ignoring", s.address, domain);
            }
            first
        })
        .collect();
    sort_by_grade(&mut servers);
    let ssl_grade = compute_domain_grade(&servers)?;

    Ok(DomainRecord {
        domain: domain.to_string(),
        servers_changed: false,
        ssl_grade,
        previous_ssl_grade: String::new(),
        logo: metadata.favicon,
        title: metadata.title,
        is_down: false,
        last_updated: now,
        servers,
    })
}
