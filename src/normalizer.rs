use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use log::debug;
use serde_json::{Map, Value};
use crate::models::{CardRecord, CardValue, ChartPoint, Feed, Fixed3, Granularity, PivotTable};
use crate::numeric::value_to_f64;

const DISPLAY_OFFSET_SECS: i32 = 7 * 3600;
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A snapshot in its canonical display shape
///
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Cards(Vec<CardRecord>),
    Chart(Vec<ChartPoint>),
    DailyChart(Vec<ChartPoint>),
    /// None when the store holds nothing at the path
    Pivot(Option<PivotTable>),
    /// None when the snapshot holds no usable number
    Gauge(Option<f64>),
}

/// Normalizes a raw snapshot according to the feed it came from
///
/// # Arguments
///
/// * 'feed' - the feed the snapshot was delivered on
/// * 'raw' - the snapshot as delivered by the store
pub fn normalize(feed: &Feed, raw: &Value) -> Payload {
    match feed {
        Feed::Cards(_) => Payload::Cards(normalize_cards(raw)),
        Feed::Chart => Payload::Chart(normalize_chart(raw)),
        Feed::DailyChart(_) => Payload::DailyChart(normalize_chart(raw)),
        Feed::Pivot(_) => Payload::Pivot(normalize_pivot(raw)),
        Feed::Co2Gauge => Payload::Gauge(normalize_gauge(raw)),
    }
}

/// Transforms a cards snapshot into card records, in the order the snapshot holds
/// them unless the records carry an explicit 'order'
///
/// # Arguments
///
/// * 'raw' - object of card key to card record, or an array where the index is the key
pub fn normalize_cards(raw: &Value) -> Vec<CardRecord> {
    let mut keyed: Vec<(String, &Value)> = match raw {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(list) => list.iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return Vec::new(),
    };
    keyed.sort_by(|a, b| card_order(a.1, b.1));

    keyed.into_iter()
        .map(|(key, record)| {
            let title = match record.get("title") {
                Some(Value::String(t)) if !t.is_empty() => t.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => key,
            };

            let value = match record.get("value") {
                Some(v) if !is_falsy(v) => match CardValue::from_json(v) {
                    CardValue::Text(text) if text.contains('T') => CardValue::Text(format_date_gmt7(&text)),
                    other => other,
                },
                _ => CardValue::Number(0.0),
            };

            let value2 = match record.get("value2") {
                None | Some(Value::Null) => None,
                Some(v) => Some(CardValue::from_json(v)),
            };

            CardRecord { title, value, value2 }
        })
        .collect()
}

/// Transforms a chart snapshot into chart points with three decimal values
///
/// # Arguments
///
/// * 'raw' - array of points, or an object with index keys
pub fn normalize_chart(raw: &Value) -> Vec<ChartPoint> {
    items(raw)
        .filter_map(|item| item.as_object())
        .map(|item| ChartPoint {
            x: item.get("x").cloned().unwrap_or(Value::Null),
            y1: fixed(item.get("y1")),
            y2: fixed(item.get("y2")),
            y3: fixed(item.get("y3")),
            y4: fixed(item.get("y4")),
        })
        .collect()
}

/// Transforms a pivot snapshot into a pivot table. The snapshot is kept as delivered,
/// its points are also grouped by granularity from either an object keyed by
/// granularity or an array of points tagged with 'series'
///
/// # Arguments
///
/// * 'raw' - the pivot snapshot
pub fn normalize_pivot(raw: &Value) -> Option<PivotTable> {
    let mut table: BTreeMap<Granularity, Vec<Map<String, Value>>> = BTreeMap::new();

    match raw {
        Value::Null => return None,
        Value::Object(map) if map.keys().any(|k| k.parse::<Granularity>().is_ok()) => {
            for (key, points) in map {
                match key.parse::<Granularity>() {
                    Ok(granularity) => {
                        let points = items(points).filter_map(|p| p.as_object().cloned()).collect();
                        table.insert(granularity, points);
                    }
                    Err(e) => debug!("ignoring pivot key: {}", e),
                }
            }
        }
        Value::Object(_) | Value::Array(_) => {
            for point in items(raw).filter_map(|p| p.as_object()) {
                let series = point.get("series").and_then(|s| s.as_str()).map(|s| s.parse::<Granularity>());
                match series {
                    Some(Ok(granularity)) => table.entry(granularity).or_default().push(point.clone()),
                    _ => debug!("pivot point without known series left ungrouped"),
                }
            }
        }
        _ => return None,
    }

    Some(PivotTable::new(raw.clone(), table))
}

/// Reads the gauge scalar, 'value' with 'value2' as fallback
///
/// # Arguments
///
/// * 'raw' - the card record holding the reading
pub fn normalize_gauge(raw: &Value) -> Option<f64> {
    let reading = raw.get("value")
        .filter(|v| !v.is_null())
        .or_else(|| raw.get("value2").filter(|v| !v.is_null()))?;

    let value = value_to_f64(reading);
    if value.is_nan() { None } else { Some(value) }
}

/// Converts a date-time string into "YYYY-MM-DD HH:MM:SS" at UTC+7, text that
/// doesn't parse is returned unchanged
///
/// # Arguments
///
/// * 'text' - date-time text, with or without offset
pub fn format_date_gmt7(text: &str) -> String {
    let parsed: Option<DateTime<Utc>> = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS.iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .and_then(|naive| naive.and_local_timezone(Local).earliest())
                .map(|dt| dt.with_timezone(&Utc))
        });

    match (parsed, FixedOffset::east_opt(DISPLAY_OFFSET_SECS)) {
        (Some(dt), Some(offset)) => dt.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => text.to_string(),
    }
}

fn fixed(value: Option<&Value>) -> Option<Fixed3> {
    value.map(|v| Fixed3::new(value_to_f64(v)))
}

/// Elements of an array, or values of an object in index order
fn items(raw: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match raw {
        Value::Array(list) => Box::new(list.iter()),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| natural_cmp(a.0, b.0));
            Box::new(entries.into_iter().map(|(_, v)| v))
        }
        _ => Box::new(std::iter::empty()),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Cards with a numeric 'order' field come first, sorted by it. Used with a stable
/// sort so cards without one keep their delivered position
fn card_order(a: &Value, b: &Value) -> Ordering {
    let order = |v: &Value| v.get("order").and_then(|o| o.as_f64());
    match (order(a), order(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares keys so that embedded numbers sort by value, "card2" before "card10"
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_number(&mut a_chars);
                let nb = take_number(&mut b_chars);
                let ta = na.trim_start_matches('0');
                let tb = nb.trim_start_matches('0');
                let ord = ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_number(it: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = it.peek().copied().filter(|c| c.is_ascii_digit()) {
        digits.push(c);
        it.next();
    }
    digits
}
