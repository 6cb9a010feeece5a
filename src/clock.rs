use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike};

const JAKARTA_OFFSET_SECS: i64 = 7 * 3600;

const DAYS: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];
const MONTHS: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni",
    "Juli", "Agustus", "September", "Oktober", "November", "Desember",
];

/// Returns the clock display text in Asia/Jakarta time, long Indonesian date
/// on the first line and 24 hour time on the second
///
/// # Arguments
///
/// * 'now' - current time in any zone
pub fn clock_text<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let local = now.naive_utc() + TimeDelta::seconds(JAKARTA_OFFSET_SECS);

    format!("{}, {} {} {}\n{:02}:{:02}:{:02}",
        DAYS[local.weekday().num_days_from_monday() as usize],
        local.day(),
        MONTHS[local.month0() as usize],
        local.year(),
        local.hour(),
        local.minute(),
        local.second())
}
