use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// When the cached reference value was fetched
///
#[derive(Serialize, Deserialize)]
pub struct FetchStamp {
    #[serde(with = "crate::serialize_timestamp")]
    pub fetched_at: DateTime<Local>,
}

/// Latest row of the trend table
///
#[derive(Debug, PartialEq)]
pub struct TrendRow {
    pub ppm: f64,
    pub date: String,
}

/// The global CO2 reference as displayed
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlobalCo2 {
    pub ppm: f64,
    pub last_update: String,
}
