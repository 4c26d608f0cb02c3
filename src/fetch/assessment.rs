//! TLS assessment source.

use log::debug;
use serde::Deserialize;
use strum_macros::EnumString;

use crate::error_handling::SourceError;
use crate::fetch::FetchContext;

/// Progress of an assessment as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AssessmentStatus {
    Dns,
    Error,
    InProgress,
    Ready,
    #[strum(default)]
    Other(String),
}

/// Assessment of one host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentReport {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub is_public: bool,
    pub status: String,
    pub status_message: String,
    pub endpoints: Vec<Endpoint>,
}

impl AssessmentReport {
    pub fn status(&self) -> AssessmentStatus {
        self.status
            .parse()
            .unwrap_or_else(|_| AssessmentStatus::Other(self.status.clone()))
    }
}

/// One assessed endpoint (IP address) of a host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    pub ip_address: String,
    pub server_name: String,
    pub status_message: String,
    pub grade: String,
    pub has_warnings: bool,
    pub is_exceptional: bool,
    pub progress: i64,
    pub duration: i64,
    pub delegation: i64,
}

/// Requests the assessment of `domain`.
///
/// # Errors
///
/// `AssessmentUnreachable` for transport failures and non-success statuses,
/// `AssessmentDecode` when the body is not an assessment report.
pub async fn fetch_assessment(
    ctx: &FetchContext,
    domain: &str,
) -> Result<AssessmentReport, SourceError> {
    debug!("Requesting assessment of {}", domain);
    let response = ctx
        .client
        .get(&ctx.assessment_api)
        .query(&[("host", domain)])
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|source| SourceError::AssessmentUnreachable {
            domain: domain.to_string(),
            source,
        })?;

    response
        .json::<AssessmentReport>()
        .await
        .map_err(|source| SourceError::AssessmentDecode {
            domain: domain.to_string(),
            source,
        })
}

/// Endpoints of a finished assessment.
///
/// # Errors
///
/// `AssessmentFailed` for status `ERROR`, `NotReady` for any other status
/// than `READY`, `NoEndpoints` when a ready report lists none.
pub fn ready_endpoints(report: AssessmentReport, domain: &str) -> Result<Vec<Endpoint>, SourceError> {
    match report.status() {
        AssessmentStatus::Ready if report.endpoints.is_empty() => Err(SourceError::NoEndpoints {
            domain: domain.to_string(),
        }),
        AssessmentStatus::Ready => Ok(report.endpoints),
        AssessmentStatus::Error => Err(SourceError::AssessmentFailed {
            domain: domain.to_string(),
            status: report.status,
        }),
        _ => Err(SourceError::NotReady {
            domain: domain.to_string(),
            status: report.status,
            message: report.status_message,
        }),
    }
}
