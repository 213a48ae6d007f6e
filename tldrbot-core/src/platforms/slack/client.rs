// File: tldrbot-core/src/platforms/slack/client.rs

use std::sync::Arc;
use std::time::Duration;
use reqwest::Client as ReqwestClient;
use url::Url;
use crate::Error;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api/";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A small wrapper client for calling Slack Web API methods.
///
/// The individual methods live in `requests::*`; this struct only holds the
/// shared HTTP client, token and base URL.
#[derive(Clone)]
pub struct SlackClient {
    http: Arc<ReqwestClient>,
    token: String,
    base_url: Url,
}

impl SlackClient {
    /// Create a new `SlackClient` against the public Slack API.
    pub fn new(token: &str) -> Result<Self, Error> {
        Self::with_base_url(token, DEFAULT_SLACK_API_BASE)
    }

    /// Create a client against another base URL (a proxy or a local stub server).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, Error> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("invalid Slack API base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            http: Arc::new(build_http_client(DEFAULT_HTTP_TIMEOUT)?),
            token: token.to_string(),
            base_url,
        })
    }

    /// Caps every request, from connect to the end of the body, at `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        self.http = Arc::new(build_http_client(timeout)?);
        Ok(self)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn http_client(&self) -> Arc<ReqwestClient> {
        self.http.clone()
    }

    /// Full URL for `method` with `params` in the query string.
    pub fn method_url(&self, method: &str, params: &[(&str, String)]) -> Result<Url, Error> {
        let mut url = self
            .base_url
            .join(method)
            .map_err(|e| Error::Config(format!("invalid Slack method '{}': {}", method, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

fn build_http_client(timeout: Duration) -> Result<ReqwestClient, Error> {
    Ok(ReqwestClient::builder().timeout(timeout).build()?)
}
