//! Error type definitions.
//!
//! One enum per layer: startup, storage, data sources, and the reconciliation
//! pass that ties them together.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// A stored value could not be mapped back onto a record.
    #[error("Corrupt row for {domain}: {reason}")]
    CorruptRow { domain: String, reason: String },
}

/// Failures of the outbound data sources.
///
/// All of these abort the lookup before anything is written.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Assessment request for {domain} failed: {source}")]
    AssessmentUnreachable {
        domain: String,
        #[source]
        source: ReqwestError,
    },

    #[error("Assessment response for {domain} could not be decoded: {source}")]
    AssessmentDecode {
        domain: String,
        #[source]
        source: ReqwestError,
    },

    /// The assessment finished with status `ERROR`; the domain is considered down.
    #[error("Assessment of {domain} failed with status {status}")]
    AssessmentFailed { domain: String, status: String },

    /// The assessment is still running (or queued); the caller should ask again later.
    #[error("Assessment of {domain} not ready ({status}): {message}")]
    NotReady {
        domain: String,
        status: String,
        message: String,
    },

    #[error("Assessment of {domain} returned no endpoints")]
    NoEndpoints { domain: String },

    #[error("Geolocation lookup for {address} failed: {source}")]
    GeoIpUnreachable {
        address: String,
        #[source]
        source: ReqwestError,
    },
}

/// Failures of a lookup once data sources and storage are combined.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A domain grade was requested for an empty server list.
    #[error("Cannot grade a domain without servers")]
    EmptyServerList,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ReconcileError {
    fn from(e: sqlx::Error) -> Self {
        ReconcileError::Database(DatabaseError::SqlError(e))
    }
}
