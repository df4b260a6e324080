// src/analyzer/verify.rs
// =============================================================================
// Checks whether the page's links are alive.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Each request has its own timeout
// - Runs checks concurrently, but never more than N at once
// - A failed check never fails the analysis: the link is just Broken
//
// The actual HTTP request sits behind the LinkProber trait, so tests can
// plug in canned answers instead of talking to the network.
//
// Rust concepts:
// - Traits: LinkProber is the "how do I check one URL" interface
// - Streams: buffer_unordered() gives us a bounded pool of running probes
// - BoxFuture: a heap-allocated future, so the trait can be used as dyn
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use log::{debug, warn};
use reqwest::Client;
use url::Url;

use super::report::{LinkRecord, Liveness};

/// What came back from checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with this status code.
    Response(u16),
    /// No response at all: DNS failure, refused connection, timeout, ...
    Failed(String),
}

impl ProbeOutcome {
    // HTTP status codes:
    // - 400-499: Client error (404 not found, etc.)  -> broken
    // - 500-599: Server error                        -> broken
    // - anything else that got a response            -> alive
    pub fn liveness(&self) -> Liveness {
        match self {
            ProbeOutcome::Response(code) if (400..600).contains(code) => Liveness::Broken,
            ProbeOutcome::Response(_) => Liveness::Alive,
            ProbeOutcome::Failed(_) => Liveness::Broken,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Response(code) => Some(*code),
            ProbeOutcome::Failed(_) => None,
        }
    }
}

/// Checks a single URL.
pub trait LinkProber: Send + Sync {
    fn probe<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, ProbeOutcome>;
}

/// The real prober: an HTTP HEAD request with a timeout.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    // The client is shared with the page fetcher (and across analyses), so
    // connections to the same host get reused. It holds no per-request state.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl LinkProber for HttpProber {
    fn probe<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(async move {
            // The timeout covers DNS, connect and waiting for headers.
            // HEAD responses have no body, so we're done once headers arrive.
            let request = self.client.head(url.clone()).send();

            match tokio::time::timeout(self.timeout, request).await {
                Ok(Ok(response)) => ProbeOutcome::Response(response.status().as_u16()),
                Ok(Err(e)) => ProbeOutcome::Failed(describe_error(&e)),
                Err(_) => ProbeOutcome::Failed("request timed out".to_string()),
            }
        })
    }
}

// Gives a reqwest error a short human-readable label.
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
fn describe_error(error: &reqwest::Error) -> String {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        if error_string.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            "connection failed".to_string()
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "SSL certificate error".to_string()
    } else {
        error.to_string()
    }
}

// Checks every http(s) link and fills in its liveness.
//
// Parameters:
//   links: classified links in document order, all still Unknown
//   prober: how to check one URL
//   concurrency: maximum number of probes in flight at once
//
// Returns: the same links, same order, with liveness and status filled in.
// Non-http links (mailto:, tel:, ftp:, ...) stay Unknown.
//
// Each distinct URL is only probed once, even if the page links to it
// several times. The outcome is then copied onto every link with that URL.
pub async fn verify_links(
    mut links: Vec<LinkRecord>,
    prober: &dyn LinkProber,
    concurrency: usize,
) -> Vec<LinkRecord> {
    let targets: Vec<&Url> = {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for link in links.iter().filter(|link| link.is_checkable()) {
            if seen.insert(link.resolved.as_str()) {
                targets.push(&link.resolved);
            }
        }
        targets
    };

    debug!(
        "probing {} distinct URL(s) with up to {} concurrent request(s)",
        targets.len(),
        concurrency
    );

    // Results arrive in completion order, not document order, so they're
    // keyed by URL and matched back onto the links afterwards
    let outcomes: HashMap<String, ProbeOutcome> = stream::iter(targets)
        .map(|url| async move {
            let outcome = prober.probe(url).await;
            match &outcome {
                ProbeOutcome::Response(code) => debug!("{} -> HTTP {}", url, code),
                ProbeOutcome::Failed(reason) => warn!("{} -> {}", url, reason),
            }
            (url.as_str().to_string(), outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for link in links.iter_mut().filter(|link| link.is_checkable()) {
        if let Some(outcome) = outcomes.get(link.resolved.as_str()) {
            link.liveness = outcome.liveness();
            link.status_code = outcome.status_code();
        }
    }

    links
}
