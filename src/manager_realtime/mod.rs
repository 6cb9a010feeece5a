pub mod errors;
mod models;

use std::time::Duration;
use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{Map, Value};
use crate::manager_realtime::errors::RealtimeError;
use crate::manager_realtime::models::{EventBody, SseEvent};
use crate::manager_subscription::{SnapshotSink, SubscriptionHandle, Transport};

/// How a stream came to an end
///
#[derive(Debug, PartialEq)]
enum StreamEnd {
    /// Server closed the connection, reconnect
    Closed,
    /// Server cancelled the subscription, don't reconnect
    Cancelled,
    /// Nobody consumes snapshots anymore
    Abandoned,
}

/// Client for a realtime database exposing the REST streaming interface
///
pub struct RealtimeDb {
    client: Client,
    database_url: String,
    reconnect: Duration,
}

impl RealtimeDb {
    /// Returns a new instance of RealtimeDb
    ///
    /// # Arguments
    ///
    /// * 'database_url' - base URL of the database, e.g. "https://x.firebasedatabase.app"
    /// * 'reconnect_secs' - delay before a dropped stream is reopened
    pub fn new(database_url: &str, reconnect_secs: u64) -> Result<Self, RealtimeError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            database_url: database_url.trim_end_matches('/').to_string(),
            reconnect: Duration::from_secs(reconnect_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }
}

impl Transport for RealtimeDb {
    fn subscribe(&self, path: &str, sink: SnapshotSink) -> SubscriptionHandle {
        let task = tokio::spawn(run_subscription(self.client.clone(), self.url(path), self.reconnect, sink));
        SubscriptionHandle::new(path, move || task.abort())
    }
}

/// Keeps a subscription streaming, reopening it whenever the server drops it
///
/// # Arguments
///
/// * 'client' - http client
/// * 'url' - the streaming URL of the path
/// * 'reconnect' - delay between attempts
/// * 'sink' - where snapshots go
async fn run_subscription(client: Client, url: String, reconnect: Duration, sink: SnapshotSink) {
    loop {
        match stream_once(&client, &url, &sink).await {
            Ok(StreamEnd::Cancelled) => {
                warn!("subscription to {} cancelled by server", url);
                return;
            }
            Ok(StreamEnd::Abandoned) => return,
            Ok(StreamEnd::Closed) => info!("stream {} closed, reconnecting", url),
            Err(e) => warn!("stream {} failed: {}", url, e),
        }

        if sink.is_closed() {
            return;
        }
        tokio::time::sleep(reconnect).await;
    }
}

/// Opens the event stream of a path and delivers a full snapshot after every change
///
async fn stream_once(client: &Client, url: &str, sink: &SnapshotSink) -> Result<StreamEnd, RealtimeError> {
    let res = client.get(url)
        .header(ACCEPT, "text/event-stream")
        .send().await?;

    let status = res.status();
    if !status.is_success() {
        return Err(RealtimeError::Stream(format!("{:?}", status)));
    }

    let mut stream = res.bytes_stream();
    let mut parser = SseParser::default();
    let mut tree = Value::Null;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for event in parser.push(&chunk) {
            match event.name.as_str() {
                "put" | "patch" => {
                    let body: EventBody = serde_json::from_str(&event.data)?;
                    if event.name == "put" {
                        apply_put(&mut tree, &body.path, body.data);
                    } else {
                        apply_patch(&mut tree, &body.path, body.data);
                    }
                    if !sink.deliver(tree.clone()) {
                        return Ok(StreamEnd::Abandoned);
                    }
                }
                "keep-alive" => (),
                "cancel" | "auth_revoked" => return Ok(StreamEnd::Cancelled),
                other => debug!("ignoring event '{}' on {}", other, url),
            }
        }
    }

    Ok(StreamEnd::Closed)
}

/// Incremental parser of a server-sent events byte stream
///
#[derive(Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    /// Feeds bytes to the parser and returns the events completed by them
    ///
    /// # Arguments
    ///
    /// * 'bytes' - next chunk of the stream, may split lines and characters
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(bytes.iter().filter(|&&b| b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }

        events
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut name = "message".to_string();
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data.is_empty() && name == "message" {
        None
    } else {
        Some(SseEvent { name, data: data.join("\n") })
    }
}

/// Replaces the subtree at a path, null data deletes it
///
/// # Arguments
///
/// * 'tree' - local copy of the subscribed path
/// * 'path' - slash separated path relative to the subscription
/// * 'data' - new subtree
pub fn apply_put(tree: &mut Value, path: &str, data: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        *tree = data;
        return;
    };

    let mut node = tree;
    for segment in parents {
        node = child_mut(node, segment);
    }

    if data.is_null() {
        match node {
            Value::Object(map) => {
                map.remove(*last);
            }
            Value::Array(list) => {
                if let Some(slot) = last.parse::<usize>().ok().and_then(|i| list.get_mut(i)) {
                    *slot = Value::Null;
                }
            }
            _ => (),
        }
    } else {
        *child_mut(node, last) = data;
    }
}

/// Merges every child of data under a path
///
/// # Arguments
///
/// * 'tree' - local copy of the subscribed path
/// * 'path' - slash separated path relative to the subscription
/// * 'data' - object of children to write
pub fn apply_patch(tree: &mut Value, path: &str, data: Value) {
    if let Value::Object(children) = data {
        for (key, value) in children {
            apply_put(tree, &format!("{}/{}", path.trim_end_matches('/'), key), value);
        }
    }
}

/// Returns the child of a node, creating it. Arrays stay arrays when indexed by
/// number, anything else becomes an object
fn child_mut<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = segment.parse::<usize>().ok();
    let keep_array = node.is_array() && index.is_some();

    if !keep_array && !node.is_object() {
        *node = match node.take() {
            Value::Array(list) => Value::Object(array_to_object(list)),
            _ => Value::Object(Map::new()),
        };
    }

    match (node, index) {
        (Value::Array(list), Some(idx)) => {
            if idx >= list.len() {
                list.resize(idx + 1, Value::Null);
            }
            &mut list[idx]
        }
        (Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
        _ => unreachable!("node is an indexed array or an object"),
    }
}

fn array_to_object(list: Vec<Value>) -> Map<String, Value> {
    list.into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_null())
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn events_split_across_chunks_are_assembled() {
        let mut parser = SseParser::default();
        assert!(parser.push(b"event: put\r\ndata: {\"path\":\"/\",").is_empty());
        let events = parser.push(b"\"data\":{\"a\":1}}\r\n\r\nevent: keep-alive\ndata: null\n\n");

        assert_eq!(events, vec![
            SseEvent { name: "put".into(), data: r#"{"path":"/","data":{"a":1}}"#.into() },
            SseEvent { name: "keep-alive".into(), data: "null".into() },
        ]);
    }

    #[test]
    fn multi_byte_characters_split_across_chunks_survive() {
        let mut parser = SseParser::default();
        let text = "event: put\ndata: {\"path\":\"/\",\"data\":\"CO₂\"}\n\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xE2).unwrap() + 1;

        assert!(parser.push(&text[..split]).is_empty());
        let events = parser.push(&text[split..]);
        assert_eq!(events[0].data, r#"{"path":"/","data":"CO₂"}"#);
    }

    #[test]
    fn put_at_root_replaces_everything() {
        let mut tree = json!({"old": true});
        apply_put(&mut tree, "/", json!({"card1": {"value": 1}}));
        assert_eq!(tree, json!({"card1": {"value": 1}}));

        apply_put(&mut tree, "/", Value::Null);
        assert_eq!(tree, Value::Null);
    }

    #[test]
    fn put_at_nested_path_creates_and_deletes() {
        let mut tree = Value::Null;
        apply_put(&mut tree, "/card1/value", json!(5));
        assert_eq!(tree, json!({"card1": {"value": 5}}));

        apply_put(&mut tree, "/card1/value2", json!("kWh"));
        apply_put(&mut tree, "/card1/value", Value::Null);
        assert_eq!(tree, json!({"card1": {"value2": "kWh"}}));
    }

    #[test]
    fn put_into_arrays_uses_indexes() {
        let mut tree = json!([{"x": "a"}, {"x": "b"}]);
        apply_put(&mut tree, "/1/y1", json!(2.5));
        apply_put(&mut tree, "/3", json!({"x": "d"}));
        assert_eq!(tree, json!([{"x": "a"}, {"x": "b", "y1": 2.5}, null, {"x": "d"}]));
    }

    #[test]
    fn patch_merges_children() {
        let mut tree = json!({"card1": {"title": "Power", "value": 1}});
        apply_patch(&mut tree, "/card1", json!({"value": 2, "value2": 3}));
        assert_eq!(tree, json!({"card1": {"title": "Power", "value": 2, "value2": 3}}));
    }

    #[test]
    fn urls_are_built_from_path() {
        let db = RealtimeDb::new("https://example.firebasedatabase.app/", 5).unwrap();
        assert_eq!(db.url("cards/CO2/card25"), "https://example.firebasedatabase.app/cards/CO2/card25.json");
    }
}
