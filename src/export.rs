use std::fmt;
use std::fmt::Formatter;
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use log::info;
use serde::Serialize;
use tokio::fs::{create_dir_all, write};
use serde_json::Value;
use crate::models::PivotSet;

const EXPORT_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Debug)]
pub struct ExportError(pub String);
impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ExportError: {}", self.0)
    }
}
impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self { ExportError(e.to_string()) }
}
impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self { ExportError(e.to_string()) }
}
impl From<&str> for ExportError {
    fn from(e: &str) -> Self { ExportError(e.to_string()) }
}

#[derive(Serialize)]
struct BackupDocument<'a> {
    timestamp: String,
    electricity: &'a Value,
    co2: &'a Value,
    water: &'a Value,
    vehicle: &'a Value,
}

/// A serialized backup ready to be written or downloaded
///
pub struct Backup {
    pub filename: String,
    pub json: String,
}

/// Tells whether the monthly export is due, which is the case during the first
/// minute of the first day of a month in the clock of 'now'
///
/// # Arguments
///
/// * 'now' - current wall clock time
pub fn should_export<Tz: TimeZone>(now: &DateTime<Tz>) -> bool {
    now.day() == 1 && now.hour() == 0 && now.minute() == 0
}

/// Serializes the pivot tables, as delivered by the store, into a backup document
/// stamped in GMT+7
///
/// # Arguments
///
/// * 'pivots' - the four pivot tables as currently displayed
/// * 'now' - time of the export
pub fn build_backup(pivots: &PivotSet, now: DateTime<Utc>) -> Result<Backup, ExportError> {
    let offset = FixedOffset::east_opt(EXPORT_OFFSET_SECS).ok_or("invalid export offset")?;
    let local = now.with_timezone(&offset);

    let document = BackupDocument {
        timestamp: local.format("%Y-%m-%d %H:%M:%S").to_string(),
        electricity: pivots.electricity.raw(),
        co2: pivots.co2.raw(),
        water: pivots.water.raw(),
        vehicle: pivots.vehicle.raw(),
    };

    Ok(Backup {
        filename: format!("backup_{}.json", local.format("%Y-%m-%d")),
        json: serde_json::to_string_pretty(&document)?,
    })
}

/// Writes a backup into the backup directory, returns the written path
///
/// # Arguments
///
/// * 'backup_dir' - directory to write to, ending with a separator
/// * 'backup' - the backup
pub async fn write_backup(backup_dir: &str, backup: &Backup) -> Result<String, ExportError> {
    create_dir_all(backup_dir).await?;
    let path = format!("{}{}", backup_dir, backup.filename);
    write(&path, &backup.json).await?;

    info!("backup written to {}", path);
    Ok(path)
}
