use serde::Deserialize;
use serde_json::Value;

/// Body of a 'put' or 'patch' server-sent event
///
#[derive(Deserialize)]
pub struct EventBody {
    pub path: String,
    #[serde(default)]
    pub data: Value,
}

/// One server-sent event, name and joined data lines
///
#[derive(Debug, PartialEq)]
pub struct SseEvent {
    pub name: String,
    pub data: String,
}
