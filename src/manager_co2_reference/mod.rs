pub mod errors;
pub mod models;

use std::future::Future;
use std::time::Duration;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use reqwest::Client;
use crate::cache::{is_same_day, read_cache_value, store_cache_value};
use crate::manager_co2_reference::errors::Co2RefError;
use crate::manager_co2_reference::models::{FetchStamp, GlobalCo2, TrendRow};
use crate::numeric::parse_float;

const KEY_VALUE: &str = "noaaDataValue";
const KEY_FETCHED: &str = "noaaDataLastFetch";

/// Global CO2 reference manager
///
pub struct Co2Reference {
    client: Client,
    url: String,
}

impl Co2Reference {

    /// Returns a new instance of Co2Reference
    ///
    /// # Arguments
    ///
    /// * 'url' - the plain text trend table, e.g. NOAA's co2_trend_gl.txt
    pub fn new(url: &str) -> Result<Self, Co2RefError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, url: url.to_string() })
    }

    /// Returns the global CO2 reference, from cache when it was fetched today
    ///
    /// # Arguments
    ///
    /// * 'cache_dir' - directory holding the cached value
    /// * 'now' - current local time
    pub async fn get_global_co2(&self, cache_dir: &str, now: DateTime<Local>) -> Result<GlobalCo2, Co2RefError> {
        cached_or_fetch(cache_dir, now, || self.fetch_latest()).await
    }

    async fn fetch_latest(&self) -> Result<TrendRow, Co2RefError> {
        let req = self.client.get(&self.url).send().await?;

        let status = req.status();
        if !status.is_success() {
            return Err(Co2RefError(format!("{:?}", status)));
        }

        let text = req.text().await?;
        parse_trend(&text)
    }
}

/// Serves the cached value when it is fresh, otherwise runs the fetch and caches
/// its result. A failed fetch leaves the cache untouched, and a result is dropped
/// in favor of the cache if that became fresh while the fetch was running. A
/// fetched value is returned even when it can't be cached
///
/// # Arguments
///
/// * 'cache_dir' - directory holding the cached value
/// * 'now' - current local time
/// * 'fetch' - produces the latest trend row
pub async fn cached_or_fetch<F, Fut>(cache_dir: &str, now: DateTime<Local>, fetch: F) -> Result<GlobalCo2, Co2RefError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<TrendRow, Co2RefError>>,
{
    if let Some(cached) = read_fresh(cache_dir, &now).await {
        debug!("global co2 served from cache");
        return Ok(cached);
    }

    let row = fetch().await?;

    if let Some(cached) = read_fresh(cache_dir, &now).await {
        debug!("cache refreshed while fetching, discarding result");
        return Ok(cached);
    }

    info!("global co2 {} ppm as of {}", row.ppm, row.date);
    if let Err(e) = store(cache_dir, row.ppm, now).await {
        warn!("global co2 not cached: {}", e);
    }

    Ok(GlobalCo2 { ppm: row.ppm, last_update: row.date })
}

async fn store(cache_dir: &str, ppm: f64, now: DateTime<Local>) -> Result<(), Co2RefError> {
    store_cache_value(cache_dir, KEY_VALUE, &ppm).await?;
    store_cache_value(cache_dir, KEY_FETCHED, &FetchStamp { fetched_at: now }).await?;
    Ok(())
}

async fn read_fresh(cache_dir: &str, now: &DateTime<Local>) -> Option<GlobalCo2> {
    let value = read_cache_value::<f64>(cache_dir, KEY_VALUE).await;
    let stamp = read_cache_value::<FetchStamp>(cache_dir, KEY_FETCHED).await;

    match (value, stamp) {
        (Ok(Some(ppm)), Ok(Some(stamp))) if is_same_day(&stamp.fetched_at, now) => Some(GlobalCo2 {
            ppm,
            last_update: stamp.fetched_at.format("%Y-%m-%d").to_string(),
        }),
        (Err(e), _) | (_, Err(e)) => {
            warn!("ignoring unreadable co2 cache: {}", e);
            None
        }
        _ => None,
    }
}

/// Picks the last valid row of the trend table. A valid row starts with a four
/// digit year and has at least five whitespace separated fields, the fifth being
/// the value
///
/// # Arguments
///
/// * 'text' - the trend table
pub fn parse_trend(text: &str) -> Result<TrendRow, Co2RefError> {
    let parts: Vec<&str> = text.lines()
        .map(|line| line.trim())
        .filter(|line| line.len() >= 4 && line.as_bytes()[..4].iter().all(u8::is_ascii_digit))
        .map(|line| line.split_whitespace().collect::<Vec<&str>>())
        .filter(|parts| parts.len() >= 5)
        .last()
        .ok_or("no valid co2 data rows")?;

    let ppm = parse_float(parts[4]);
    if ppm.is_nan() {
        return Err(Co2RefError(format!("co2 value '{}' could not be parsed", parts[4])));
    }

    Ok(TrendRow {
        ppm,
        date: format!("{}-{:0>2}-{:0>2}", parts[0], parts[1], parts[2]),
    })
}
