//! Domain and server records.
//!
//! These are both the persisted aggregate and the JSON payload returned by the
//! lookup endpoint, so serde field names are part of the public contract.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TIMESTAMP_FORMAT;

/// One TLS endpoint of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// IP address reported by the assessment source; unique within a domain
    pub address: String,
    /// TLS grade of this endpoint (e.g. `A+`, `B`, `F`)
    pub ssl_grade: String,
    /// Country reported by the geolocation source
    pub country: String,
    /// Network owner (AS description) reported by the geolocation source
    pub owner: String,
}

impl ServerRecord {
    pub fn new(
        address: impl Into<String>,
        ssl_grade: impl Into<String>,
        country: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            ssl_grade: ssl_grade.into(),
            country: country.into(),
            owner: owner.into(),
        }
    }
}

/// The stored aggregate for one assessed domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
    pub servers_changed: bool,
    /// Worst grade across `servers`
    pub ssl_grade: String,
    /// Grade as it was before the last reconciliation pass
    pub previous_ssl_grade: String,
    /// Favicon href as found in the home page markup
    pub logo: String,
    pub title: String,
    pub is_down: bool,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "Servers")]
    pub servers: Vec<ServerRecord>,
}

/// Title and favicon scraped from a domain's home page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub favicon: String,
}

/// Error payload returned for failed lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub ok: bool,
    pub status: String,
    pub is_down: bool,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(status: impl Into<String>, is_down: bool, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: status.into(),
            is_down,
            message: message.into(),
        }
    }

    /// The catch-all payload used for storage failures.
    pub fn generic() -> Self {
        Self::new("ERROR", true, "ERROR")
    }
}

/// Payload of the consulted-domains endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultedPayload {
    pub ok: bool,
    /// Always `false`; kept so existing clients see the same shape
    pub message: bool,
    pub domains: Vec<String>,
}

/// Current time at the resolution records are stored and rendered with.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// `last_updated` is rendered as `YYYY-MM-DD HH:MM:SS` in UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
