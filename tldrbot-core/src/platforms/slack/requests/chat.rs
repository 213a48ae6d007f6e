// File: tldrbot-core/src/platforms/slack/requests/chat.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::Error;
use crate::platforms::slack::client::SlackClient;

const POST_MESSAGE: &str = "chat.postMessage";

#[derive(Debug, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

impl SlackClient {
    /// Sends `text` to a channel, group or DM id.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        debug!("Calling {} on {}", POST_MESSAGE, channel);

        let url = self.method_url(POST_MESSAGE, &[])?;
        let resp = self
            .http_client()
            .post(url)
            .bearer_auth(self.token())
            .json(&PostMessageRequest { channel, text })
            .send()
            .await
            .map_err(|e| Error::api(POST_MESSAGE, channel, format!("network error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("{} => status={} body={}", POST_MESSAGE, status, body);
            return Err(Error::api(POST_MESSAGE, channel, format!("HTTP {}", status)));
        }

        let parsed: PostMessageResponse = resp
            .json()
            .await
            .map_err(|e| Error::api(POST_MESSAGE, channel, format!("error parsing response: {e}")))?;

        if !parsed.ok {
            return Err(Error::api(
                POST_MESSAGE,
                channel,
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}
