//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Config;

/// Initializes the HTTP client shared by all data sources.
///
/// Uses the configured user agent and per-request timeout. Redirects are
/// followed with reqwest's default policy so home pages that bounce to
/// `https://` or `www.` still yield metadata.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_with_defaults() {
        let client = init_client(&Config::default());
        assert!(client.is_ok());
    }
}
