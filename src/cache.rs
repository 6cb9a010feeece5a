use chrono::{DateTime, Datelike, TimeZone};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::{create_dir_all, read_to_string, write};

/// Writes a value under a key to the local cache
///
/// # Arguments
///
/// * 'cache_dir' - directory to store data in
/// * 'key' - key identifying the entry
/// * 'data' - data to store
pub async fn store_cache_value<T: Serialize>(cache_dir: &str, key: &str, data: &T) -> Result<(), std::io::Error> {
    create_dir_all(cache_dir).await?;
    let path = format!("{}{}.json", cache_dir, key);

    let json = serde_json::to_string(data)?;
    write(path, json).await?;

    Ok(())
}

/// Tries to read a value under a key from the local cache.
/// A missing entry gives None, an entry that doesn't parse is an error
///
/// # Arguments
///
/// * 'cache_dir' - directory to read data from
/// * 'key' - key identifying the entry
pub async fn read_cache_value<T: DeserializeOwned>(cache_dir: &str, key: &str) -> Result<Option<T>, std::io::Error> {
    let path = format!("{}{}.json", cache_dir, key);

    if let Ok(json) = read_to_string(path).await {
        let result: T = serde_json::from_str(&json)?;
        Ok(Some(result))
    } else {
        Ok(None)
    }
}

/// Tells whether two instants fall on the same calendar day, compared on
/// year, month and day in the time zone of 'now'
///
/// # Arguments
///
/// * 'fetched_at' - when the cached value was fetched
/// * 'now' - current time
pub fn is_same_day<Tz: TimeZone, Tz2: TimeZone>(fetched_at: &DateTime<Tz2>, now: &DateTime<Tz>) -> bool {
    let fetched = fetched_at.with_timezone(&now.timezone());
    fetched.year() == now.year() && fetched.month() == now.month() && fetched.day() == now.day()
}
