//! Shared resources for talking to the data sources.

use std::sync::Arc;

use crate::config::{Config, DOMAIN_PLACEHOLDER};

/// Everything a lookup needs to reach the assessment, geolocation and
/// home-page sources.
///
/// Cheap to clone; the HTTP client is shared.
#[derive(Clone)]
pub struct FetchContext {
    /// HTTP client used for every outbound request
    pub client: Arc<reqwest::Client>,
    /// Assessment endpoint, queried with `?host=<domain>`
    pub assessment_api: String,
    /// Geolocation endpoint, the address is appended as a path segment
    pub geoip_api: String,
    /// Home page URL with a `{domain}` placeholder
    pub home_page_template: String,
    /// Geolocation requests in flight per lookup
    pub max_geoip_concurrency: usize,
}

impl FetchContext {
    pub fn new(client: Arc<reqwest::Client>, config: &Config) -> Self {
        Self {
            client,
            assessment_api: config.assessment_api.clone(),
            geoip_api: config.geoip_api.clone(),
            home_page_template: config.home_page_template.clone(),
            max_geoip_concurrency: config.max_geoip_concurrency.max(1),
        }
    }

    pub fn home_page_url(&self, domain: &str) -> String {
        self.home_page_template.replace(DOMAIN_PLACEHOLDER, domain)
    }

    pub fn geoip_url(&self, address: &str) -> String {
        format!("{}/{}", self.geoip_api.trim_end_matches('/'), address)
    }
}
