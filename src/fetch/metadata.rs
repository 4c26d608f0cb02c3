//! Home page metadata source.

use log::{debug, warn};

use crate::config::MAX_HOME_PAGE_SIZE;
use crate::fetch::FetchContext;
use crate::models::PageMetadata;
use crate::parse::parse_page_metadata;

/// Fetches the home page of `domain` and extracts title and favicon.
///
/// Never fails: an unreachable or unreadable page yields empty metadata.
/// The body is parsed whatever the response status.
pub async fn fetch_page_metadata(ctx: &FetchContext, domain: &str) -> PageMetadata {
    let url = ctx.home_page_url(domain);
    match read_home_page(ctx, &url).await {
        Ok(body) => {
            let metadata = parse_page_metadata(&body);
            debug!(
                "Home page {}: title {:?}, favicon {:?}",
                url, metadata.title, metadata.favicon
            );
            metadata
        }
        Err(e) => {
            warn!("Could not read home page {}: {}", url, e);
            PageMetadata::default()
        }
    }
}

/// Reads at most `MAX_HOME_PAGE_SIZE` bytes of the page body.
async fn read_home_page(ctx: &FetchContext, url: &str) -> Result<String, reqwest::Error> {
    let mut response = ctx.client.get(url).send().await?;

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let remaining = MAX_HOME_PAGE_SIZE.saturating_sub(body.len());
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            debug!("Home page {} truncated at {} bytes", url, MAX_HOME_PAGE_SIZE);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}
