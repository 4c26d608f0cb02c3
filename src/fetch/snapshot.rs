//! Assembling a fresh snapshot of a domain from all data sources.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};

use crate::error_handling::{ReconcileError, SourceError};
use crate::fetch::assessment::{fetch_assessment, ready_endpoints};
use crate::fetch::geoip::lookup_geoip;
use crate::fetch::metadata::fetch_page_metadata;
use crate::fetch::FetchContext;
use crate::models::{DomainRecord, ServerRecord};
use crate::reconcile::build_fresh_record;

/// Servers of `domain` with grade and geolocation, in endpoint order.
///
/// Geolocation lookups run concurrently up to `max_geoip_concurrency`; the
/// first failed lookup aborts the whole snapshot.
///
/// # Errors
///
/// Any [`SourceError`] of the assessment or geolocation sources.
pub async fn fetch_server_snapshot(
    ctx: &FetchContext,
    domain: &str,
) -> Result<Vec<ServerRecord>, SourceError> {
    let report = fetch_assessment(ctx, domain).await?;
    let endpoints = ready_endpoints(report, domain)?;
    debug!("{} has {} endpoints", domain, endpoints.len());

    stream::iter(endpoints)
        .map(|endpoint| async move {
            let location = lookup_geoip(ctx, &endpoint.ip_address).await?;
            Ok::<_, SourceError>(ServerRecord::new(
                endpoint.ip_address,
                endpoint.grade,
                location.country,
                location.owner,
            ))
        })
        .buffered(ctx.max_geoip_concurrency)
        .try_collect()
        .await
}

/// Fetches everything known about `domain` and builds a fresh record
/// stamped with `now`.
///
/// # Errors
///
/// Source errors abort before the home page is requested.
pub async fn fetch_domain(
    ctx: &FetchContext,
    domain: &str,
    now: DateTime<Utc>,
) -> Result<DomainRecord, ReconcileError> {
    info!("Fetching fresh data for {}", domain);
    let servers = fetch_server_snapshot(ctx, domain).await?;
    let metadata = fetch_page_metadata(ctx, domain).await;
    build_fresh_record(domain, servers, metadata, now)
}
