use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub enum RealtimeError {
    Stream(String),
    Document(String),
    Other(String),
}

impl fmt::Display for RealtimeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RealtimeError::Stream(e)   => write!(f, "RealtimeError::Stream: {}", e),
            RealtimeError::Document(e) => write!(f, "RealtimeError::Document: {}", e),
            RealtimeError::Other(e)    => write!(f, "RealtimeError::Other: {}", e),
        }
    }
}
impl From<String> for RealtimeError {
    fn from(e: String) -> Self {
        RealtimeError::Other(e)
    }
}
impl From<&str> for RealtimeError {
    fn from(e: &str) -> Self {
        RealtimeError::Other(e.to_string())
    }
}
impl From<reqwest::Error> for RealtimeError {
    fn from(e: reqwest::Error) -> RealtimeError {
        RealtimeError::Stream(e.to_string())
    }
}
impl From<serde_json::Error> for RealtimeError {
    fn from(e: serde_json::Error) -> RealtimeError {
        RealtimeError::Document(e.to_string())
    }
}
