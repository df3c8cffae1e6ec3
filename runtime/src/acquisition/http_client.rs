//! Static page fetcher wrapping reqwest.
//!
//! One request per page with a fixed client identity. No retries: a failed
//! page is logged and skipped, and the next run picks it up again.

use super::{join_url, StaticSource};
use crate::config::USER_AGENT;
use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

/// HTTP fetcher bound to one upstream site.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.to_string(),
            timeout,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Perform a single GET and classify the failure if there is one.
    pub async fn get(&self, url: &str) -> IngestResult<FetchedPage> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, &e, self.timeout))?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        if !resp.status().is_success() {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IngestError::network(url, format!("failed to read body: {e}")))?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status,
            body,
        })
    }
}

fn classify(url: &str, e: &reqwest::Error, timeout: Duration) -> IngestError {
    let message = if e.is_timeout() {
        format!("timed out after {}ms", timeout.as_millis())
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else if e.is_redirect() {
        format!("too many redirects: {e}")
    } else {
        format!("request failed: {e}")
    };
    IngestError::network(url, message)
}

#[async_trait]
impl StaticSource for HttpFetcher {
    async fn fetch_document(&self, path: &str) -> Option<String> {
        let url = self.url_for(path);
        match self.get(&url).await {
            Ok(page) => {
                debug!(url = %page.final_url, bytes = page.body.len(), "fetched page");
                Some(page.body)
            }
            Err(e) => {
                warn!(%url, error = %e, "fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_sends_client_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Dooley"))
            // The identity contains commas, so compare the raw header value.
            .and(|req: &Request| {
                req.headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    == Some(USER_AGENT)
            })
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Dooley</p>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&format!("{}/wiki/", server.uri()), Duration::from_secs(5));
        let body = fetcher.fetch_document("Dooley").await;
        assert_eq!(body.as_deref(), Some("<p>Dooley</p>"));

        let received = server.received_requests().await.unwrap();
        let sent = received[0].headers.get("user-agent").unwrap();
        assert_eq!(sent.to_str().unwrap(), USER_AGENT);
    }

    #[tokio::test]
    async fn test_status_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&server.uri(), Duration::from_secs(5));
        let err = fetcher.get(&fetcher.url_for("Missing")).await.unwrap_err();
        assert!(matches!(err, IngestError::HttpStatus { status: 404, .. }));
        assert!(fetcher.fetch_document("Missing").await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&server.uri(), Duration::from_millis(50));
        let err = fetcher.get(&fetcher.url_for("Slow")).await.unwrap_err();
        match err {
            IngestError::Network { message, .. } => assert!(message.contains("timed out")),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_degrades_to_none() {
        let fetcher = HttpFetcher::new("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(fetcher.fetch_document("anything").await.is_none());
    }
}
