//! Outbound data sources.
//!
//! A fresh snapshot of a domain combines three sources:
//! - the TLS assessment API (endpoints and their grades)
//! - the IP geolocation API (country and owner of each endpoint)
//! - the domain's home page (title and favicon)
//!
//! Assessment and geolocation failures abort the lookup; home page failures
//! only leave title and logo empty.

mod assessment;
mod context;
mod geoip;
mod metadata;
mod snapshot;

pub use assessment::{
    fetch_assessment, ready_endpoints, AssessmentReport, AssessmentStatus, Endpoint,
};
pub use context::FetchContext;
pub use geoip::{lookup_geoip, GeoLocation};
pub use metadata::fetch_page_metadata;
pub use snapshot::{fetch_domain, fetch_server_snapshot};
