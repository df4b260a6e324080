// src/fetch.rs
// =============================================================================
// Downloads the page to analyze.
//
// One GET request. Redirects are followed by the client (up to the limit set
// in AnalyzerConfig). Anything other than a 2xx at the end is a failure, and
// so is a request that takes longer than the fetch timeout.
// =============================================================================

use std::time::Duration;

use log::debug;
use reqwest::Client;
use url::Url;

use crate::error::FetchError;

// Parses and checks a URL given on the command line.
pub fn parse_page_url(input: &str) -> Result<Url, FetchError> {
    let url = Url::parse(input.trim()).map_err(|e| FetchError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

// Fetches a web page and returns its body as raw bytes.
//
// Bytes, not a String: the doctype check wants the raw bytes, and we don't
// want to fail on a page that isn't valid UTF-8.
pub async fn fetch_page(client: &Client, url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }

    let request = async {
        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok::<_, FetchError>(body.to_vec())
    };

    let body = tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| FetchError::Timeout {
            url: url.to_string(),
        })??;

    debug!("fetched {} ({} bytes)", url, body.len());
    Ok(body)
}
