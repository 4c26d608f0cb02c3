//! IP geolocation source.

use log::warn;
use serde::Deserialize;

use crate::error_handling::SourceError;
use crate::fetch::FetchContext;

/// Country and network owner of one address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeoLocation {
    pub country: String,
    /// AS description, e.g. `AS15169 Google LLC`
    #[serde(rename = "as")]
    pub owner: String,
}

/// Looks up `address`.
///
/// A body that cannot be decoded yields empty fields.
///
/// # Errors
///
/// `GeoIpUnreachable` when the request itself fails.
pub async fn lookup_geoip(ctx: &FetchContext, address: &str) -> Result<GeoLocation, SourceError> {
    let response = ctx
        .client
        .get(ctx.geoip_url(address))
        .send()
        .await
        .map_err(|source| SourceError::GeoIpUnreachable {
            address: address.to_string(),
            source,
        })?;

    match response.json::<GeoLocation>().await {
        Ok(location) => Ok(location),
        Err(e) => {
            warn!("Undecodable geolocation for {}: {}", address, e);
            Ok(GeoLocation::default())
        }
    }
}
