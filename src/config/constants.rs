//! Configuration constants.
//!
//! Defaults for the data sources, the staleness window and the HTTP listener.
//! Everything here can be overridden through [`crate::Config`].

pub const DB_PATH: &str = "./domain_grade.db";

/// Port the original service listened on
pub const DEFAULT_PORT: u16 = 3500;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Minutes after which a stored domain is re-fetched and reconciled.
/// A record exactly this old is still served from the store.
pub const STALENESS_WINDOW_MINUTES: i64 = 60;

/// Bounds accepted for the staleness window: one minute to one year
pub const MIN_STALENESS_MINUTES: i64 = 1;
pub const MAX_STALENESS_MINUTES: i64 = 525_600;

/// Per-request timeout for outbound calls in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Geolocation lookups allowed in flight per domain
pub const MAX_GEOIP_CONCURRENCY: usize = 4;

/// TLS assessment endpoint; the domain goes in the `host` query parameter
pub const ASSESSMENT_API_URL: &str = "https://api.ssllabs.com/api/v3/analyze";

/// IP geolocation endpoint; the address is appended as a path segment
pub const GEOIP_API_URL: &str = "http://ip-api.com/json";

/// Home page location; `{domain}` is replaced with the looked-up name
pub const HOME_PAGE_TEMPLATE: &str = "http://{domain}";
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Layout of `last_updated` in responses
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Upper bound on the home page body we parse (2MB)
pub const MAX_HOME_PAGE_SIZE: usize = 2 * 1024 * 1024;

pub const DEFAULT_USER_AGENT: &str = concat!("domain_grade/", env!("CARGO_PKG_VERSION"));
