//! Configuration types and CLI options.
//!
//! [`Config`] doubles as the clap parser for the binary and as a plain struct
//! for library callers and tests.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    ASSESSMENT_API_URL, DB_PATH, DEFAULT_BIND_ADDRESS, DEFAULT_PORT, DEFAULT_USER_AGENT,
    GEOIP_API_URL, HOME_PAGE_TEMPLATE, HTTP_TIMEOUT_SECS, MAX_GEOIP_CONCURRENCY,
    MAX_STALENESS_MINUTES, MIN_STALENESS_MINUTES, STALENESS_WINDOW_MINUTES,
};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Which stored field a fresh server's owner is compared against when
/// deciding whether the server changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum OwnerComparison {
    /// Fresh owner against stored owner
    #[default]
    Owner,
    /// Fresh country against stored owner, as the first deployment did.
    /// Flags nearly every server as changed on each refresh.
    Country,
}

/// What gets written to `servers_changed` when a domain row is updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum ServersChangedMode {
    /// Always `true` on update
    #[default]
    Always,
    /// Whatever the diff pass computed
    Computed,
}

/// Library and CLI configuration.
///
/// # Examples
///
/// ```no_run
/// use domain_grade::Config;
///
/// let config = Config {
///     port: 8080,
///     staleness_minutes: 15,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "domain_grade",
    about = "Serves TLS grades and hosting details for domains, cached in SQLite."
)]
pub struct Config {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, value_parser, default_value = DB_PATH, env = "DOMAIN_GRADE_DB_PATH")]
    pub db_path: PathBuf,

    /// Address the HTTP API binds to
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    /// Port the HTTP API listens on
    #[arg(long, default_value_t = DEFAULT_PORT, env = "DOMAIN_GRADE_PORT")]
    pub port: u16,

    /// Per-request timeout for outbound calls in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value for outbound calls
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// TLS assessment API endpoint
    #[arg(long, default_value = ASSESSMENT_API_URL)]
    pub assessment_api: String,

    /// IP geolocation API endpoint
    #[arg(long, default_value = GEOIP_API_URL)]
    pub geoip_api: String,

    /// Home page URL template; `{domain}` is replaced with the domain name
    #[arg(long, default_value = HOME_PAGE_TEMPLATE)]
    pub home_page_template: String,

    /// Minutes before a stored domain is refreshed
    #[arg(
        long,
        default_value_t = STALENESS_WINDOW_MINUTES,
        value_parser = clap::value_parser!(i64).range(MIN_STALENESS_MINUTES..=MAX_STALENESS_MINUTES)
    )]
    pub staleness_minutes: i64,

    /// Stored field a fresh owner is compared against: owner|country
    #[arg(long, value_enum, default_value_t = OwnerComparison::Owner)]
    pub owner_comparison: OwnerComparison,

    /// Value persisted as `servers_changed` on update: always|computed
    #[arg(long, value_enum, default_value_t = ServersChangedMode::Always)]
    pub servers_changed_mode: ServersChangedMode,

    /// Concurrent geolocation lookups per domain
    #[arg(long, default_value_t = MAX_GEOIP_CONCURRENCY)]
    pub max_geoip_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            bind: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            timeout_seconds: HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            assessment_api: ASSESSMENT_API_URL.to_string(),
            geoip_api: GEOIP_API_URL.to_string(),
            home_page_template: HOME_PAGE_TEMPLATE.to_string(),
            staleness_minutes: STALENESS_WINDOW_MINUTES,
            owner_comparison: OwnerComparison::default(),
            servers_changed_mode: ServersChangedMode::default(),
            max_geoip_concurrency: MAX_GEOIP_CONCURRENCY,
        }
    }
}
