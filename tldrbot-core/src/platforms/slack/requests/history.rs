// File: tldrbot-core/src/platforms/slack/requests/history.rs

use serde::Deserialize;
use tracing::{debug, info, warn};
use crate::Error;
use crate::models::{ChannelRef, MessageRecord};
use crate::platforms::slack::client::SlackClient;

/// Response from `channels.history` / `groups.history`.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<SlackMessage>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SlackMessage {
    /// Decimal seconds as a string, e.g. `"1512085950.000216"`.
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reactions: Option<Vec<SlackReaction>>,
}

#[derive(Debug, Deserialize)]
pub struct SlackReaction {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

impl SlackMessage {
    pub fn into_record(self) -> Result<MessageRecord, Error> {
        let timestamp: f64 = self
            .ts
            .parse()
            .map_err(|e| Error::Parse(format!("bad message ts '{}': {}", self.ts, e)))?;

        Ok(MessageRecord {
            timestamp,
            author: self.user,
            text: self.text,
            // one per distinct emoji, not per click
            reaction_count: self.reactions.map(|r| r.len() as u32),
        })
    }
}

/// Upper bound on pages followed in one fetch.
pub const MAX_HISTORY_PAGES: usize = 20;

/// One decoded page of history, newest first as Slack sends it.
#[derive(Debug)]
pub struct HistoryPage {
    pub records: Vec<MessageRecord>,
    pub has_more: bool,
    /// Raw `ts` of the oldest message on the page; the `latest` cursor for the next one.
    pub oldest_ts: Option<String>,
}

impl HistoryPage {
    /// Where the next request should end, if there is another page to fetch.
    pub fn next_latest(&self) -> Option<&str> {
        if self.has_more { self.oldest_ts.as_deref() } else { None }
    }
}

pub fn parse_history(body: &str, method: &str, channel: &ChannelRef) -> Result<HistoryPage, Error> {
    let parsed: HistoryResponse = serde_json::from_str(body)?;

    if !parsed.ok {
        return Err(Error::api(
            method,
            &channel.id,
            parsed.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let oldest_ts = parsed.messages.last().map(|m| m.ts.clone());
    let mut records = Vec::with_capacity(parsed.messages.len());
    for message in parsed.messages {
        match message.into_record() {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping message in {}: {}", channel, e),
        }
    }

    Ok(HistoryPage {
        records,
        has_more: parsed.has_more.unwrap_or(false),
        oldest_ts,
    })
}

impl SlackClient {
    /// Calls the history method matching the channel id prefix, following
    /// `has_more` backwards until the `since` boundary is reached.
    ///
    /// An unrecognised prefix is returned as `Error::UnknownChannelKind` before any
    /// request is made. Records come back newest first across all pages.
    pub async fn fetch_history(
        &self,
        channel: &ChannelRef,
        since: Option<f64>,
    ) -> Result<Vec<MessageRecord>, Error> {
        info!("Getting messages for channel {}", channel);
        let method = channel.kind()?.history_method();

        let mut records = Vec::new();
        let mut latest: Option<String> = None;
        for page_number in 1..=MAX_HISTORY_PAGES {
            let mut params = vec![("channel", channel.id.clone())];
            if let Some(oldest) = since {
                params.push(("oldest", format!("{:.6}", oldest)));
            }
            if let Some(latest) = &latest {
                params.push(("latest", latest.clone()));
            }

            let body = self.history_page(method, channel, &params).await?;
            let page = parse_history(&body, method, channel)?;
            let next = page.next_latest().map(str::to_string);
            records.extend(page.records);

            match next {
                Some(cursor) => {
                    debug!("{} for {} has more before {} (page {})", method, channel, cursor, page_number);
                    latest = Some(cursor);
                }
                None => return Ok(records),
            }
        }

        warn!(
            "{} for {} still had more after {} pages; older messages were skipped",
            method, channel, MAX_HISTORY_PAGES
        );
        Ok(records)
    }

    async fn history_page(
        &self,
        method: &str,
        channel: &ChannelRef,
        params: &[(&str, String)],
    ) -> Result<String, Error> {
        debug!("Calling {} on {} ({:?})", method, channel.id, params);

        let url = self.method_url(method, params)?;
        let resp = self
            .http_client()
            .get(url)
            .bearer_auth(self.token())
            .send()
            .await
            .map_err(|e| Error::api(method, &channel.id, format!("network error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::api(method, &channel.id, format!("error reading body: {e}")))?;

        if !status.is_success() {
            warn!("{} => status={} body={}", method, status, body);
            return Err(Error::api(method, &channel.id, format!("HTTP {}", status)));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned JSON body per connection and records each request line.
    async fn serve_pages(pages: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = requests.clone();

        tokio::spawn(async move {
            for body in pages {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap();
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                sink.lock().push(request.lines().next().unwrap_or_default().to_string());

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/api/", addr), requests)
    }

    fn general() -> ChannelRef {
        ChannelRef::new("C0001", Some("general"))
    }

    #[test]
    fn parses_messages_newest_first() {
        let body = r#"{
            "ok": true,
            "has_more": false,
            "messages": [
                {
                    "type": "message",
                    "ts": "1512085950.000216",
                    "user": "U2",
                    "text": "second",
                    "reactions": [
                        { "name": "tada", "count": 3, "users": ["U1", "U3", "U4"] },
                        { "name": "eyes", "count": 1, "users": ["U5"] }
                    ]
                },
                { "type": "message", "subtype": "bot_message", "ts": "1512085900.000100", "text": "first" }
            ]
        }"#;

        let page = parse_history(body, "channels.history", &general()).unwrap();
        assert!(page.next_latest().is_none());
        let records = page.records;
        assert_eq!(records.len(), 2);
        assert!((records[0].timestamp - 1_512_085_950.000216).abs() < 1e-6);
        assert_eq!(records[0].author.as_deref(), Some("U2"));
        assert_eq!(records[0].reaction_count, Some(2));
        assert_eq!(records[1].author, None);
        assert_eq!(records[1].reaction_count, None);
        assert!(records[0].timestamp > records[1].timestamp);
    }

    #[test]
    fn not_ok_becomes_api_error() {
        let body = r#"{ "ok": false, "error": "channel_not_found" }"#;
        match parse_history(body, "groups.history", &general()) {
            Err(Error::Api { method, channel, message }) => {
                assert_eq!(method, "groups.history");
                assert_eq!(channel, "C0001");
                assert_eq!(message, "channel_not_found");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn bad_timestamps_are_skipped() {
        let body = r#"{ "ok": true, "messages": [
            { "ts": "not-a-number", "text": "x" },
            { "ts": "10.5", "text": "y" }
        ] }"#;
        let records = parse_history(body, "channels.history", &general()).unwrap().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, 10.5);
    }

    #[tokio::test]
    async fn unknown_prefix_fails_before_any_request() {
        // unroutable base: a request would fail with an Api error instead
        let client = SlackClient::with_base_url("t", "http://127.0.0.1:9/").unwrap();
        let err = client
            .fetch_history(&ChannelRef::new("D0001", Some("dm")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownChannelKind { .. }));
    }

    #[test]
    fn partial_page_points_at_its_oldest_message() {
        let body = r#"{ "ok": true, "has_more": true, "messages": [
            { "ts": "30.000100", "text": "c" },
            { "ts": "20.000100", "text": "b" }
        ] }"#;
        let page = parse_history(body, "channels.history", &general()).unwrap();
        assert_eq!(page.next_latest(), Some("20.000100"));
    }

    #[tokio::test]
    async fn follows_has_more_until_the_last_page() {
        let (base, requests) = serve_pages(vec![
            r#"{ "ok": true, "has_more": true, "messages": [
                { "ts": "30.000000", "user": "U1", "text": "c" },
                { "ts": "20.000000", "user": "U1", "text": "b" }
            ] }"#,
            r#"{ "ok": true, "has_more": false, "messages": [
                { "ts": "10.000000", "user": "U1", "text": "a" }
            ] }"#,
        ])
        .await;

        let client = SlackClient::with_base_url("xoxb-test", &base).unwrap();
        let records = client.fetch_history(&general(), Some(5.0)).await.unwrap();

        let stamps: Vec<f64> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![30.0, 20.0, 10.0]);

        let requests = requests.lock();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains("/api/channels.history?channel=C0001&oldest=5.000000 "), "{}", requests[0]);
        assert!(requests[1].contains("&oldest=5.000000&latest=20.000000 "), "{}", requests[1]);
    }
}
