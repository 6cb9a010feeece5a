use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use crate::numeric::field_or_zero;

/// The dashboard views, in auto-cycle order
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewKey {
    Overview,
    Electricity,
    Co2,
    Water,
    VehicleCounter,
}

impl ViewKey {
    pub const ALL: [ViewKey; 5] = [
        ViewKey::Overview,
        ViewKey::Electricity,
        ViewKey::Co2,
        ViewKey::Water,
        ViewKey::VehicleCounter,
    ];

    /// Path segment used by the realtime store, e.g. "VEHICLE_COUNTER"
    pub fn segment(&self) -> &'static str {
        match self {
            ViewKey::Overview => "OVERVIEW",
            ViewKey::Electricity => "ELECTRICITY",
            ViewKey::Co2 => "CO2",
            ViewKey::Water => "WATER",
            ViewKey::VehicleCounter => "VEHICLE_COUNTER",
        }
    }

    /// Returns the view following this one, wrapping from last to first
    pub fn next(&self) -> ViewKey {
        let idx = ViewKey::ALL.iter().position(|k| k == self).unwrap_or(0);
        ViewKey::ALL[(idx + 1) % ViewKey::ALL.len()]
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment())
    }
}

impl FromStr for ViewKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(' ', "_");
        ViewKey::ALL.iter()
            .find(|k| k.segment() == normalized)
            .copied()
            .ok_or_else(|| format!("unknown view: {}", s))
    }
}

/// Sensor domains that publish pivot tables
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Electricity,
    Co2,
    Water,
    Vehicle,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Electricity, Domain::Co2, Domain::Water, Domain::Vehicle];

    pub fn pivot_path(&self) -> &'static str {
        match self {
            Domain::Electricity => "charts/ELECTRICITY_PIVOT",
            Domain::Co2 => "charts/CO2_PIVOT",
            Domain::Water => "charts/WATER_PIVOT",
            Domain::Vehicle => "charts/VEHICLE_PIVOT",
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electricity" => Ok(Domain::Electricity),
            "co2" => Ok(Domain::Co2),
            "water" => Ok(Domain::Water),
            "vehicle" | "vehicle_counter" => Ok(Domain::Vehicle),
            _ => Err(format!("unknown domain: {}", s)),
        }
    }
}

/// Time granularity keys of a pivot table
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [Granularity::Hour, Granularity::Day, Granularity::Week, Granularity::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL.iter()
            .find(|g| g.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| format!("unknown granularity: {}", s))
    }
}

/// A card value is either a number or display text
///
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardValue {
    Number(f64),
    Text(String),
}

impl CardValue {
    /// Converts a raw JSON value, objects and arrays become their JSON text
    pub fn from_json(value: &Value) -> CardValue {
        match value {
            Value::Number(n) => CardValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => CardValue::Text(s.clone()),
            Value::Bool(b) => CardValue::Text(b.to_string()),
            Value::Null => CardValue::Number(0.0),
            other => CardValue::Text(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardRecord {
    pub title: String,
    pub value: CardValue,
    pub value2: Option<CardValue>,
}

/// A number held at full precision but rendered with exactly three decimals,
/// values that are not finite render as "0"
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fixed3(pub f64);

impl Fixed3 {
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Fixed3((value * 1000.0).round() / 1000.0)
        } else {
            Fixed3(value)
        }
    }
}

impl Serialize for Fixed3 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        crate::numeric::display_number(self.0, 3).serialize(serializer)
    }
}

/// One point of a line/area/bar chart
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y1: Option<Fixed3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<Fixed3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y3: Option<Fixed3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y4: Option<Fixed3>,
}

/// Pivot table as delivered by the store, together with its points grouped by
/// granularity. Serializes as the delivered snapshot
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PivotTable {
    raw: Value,
    series: BTreeMap<Granularity, Vec<Map<String, Value>>>,
}

impl Serialize for PivotTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl PivotTable {
    /// Returns a new pivot table
    ///
    /// # Arguments
    ///
    /// * 'raw' - the snapshot exactly as delivered
    /// * 'series' - its points grouped by granularity
    pub fn new(raw: Value, series: BTreeMap<Granularity, Vec<Map<String, Value>>>) -> Self {
        Self { raw, series }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Points of a granularity, an absent granularity is an empty sequence
    pub fn points(&self, granularity: Granularity) -> &[Map<String, Value>] {
        self.series.get(&granularity).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Numeric field of a point, trying "<granularity>_<field>" before "<field>",
    /// a missing point or field gives zero
    ///
    /// # Arguments
    ///
    /// * 'granularity' - granularity to read from
    /// * 'index' - point index
    /// * 'field' - field name without granularity prefix, e.g. "y1"
    pub fn field(&self, granularity: Granularity, index: usize, field: &str) -> f64 {
        match self.points(granularity).get(index) {
            Some(point) => {
                let prefixed = format!("{}_{}", granularity.as_str(), field);
                field_or_zero(point.get(&prefixed).or_else(|| point.get(field)))
            }
            None => 0.0,
        }
    }

    /// Label of a point, if the point exists
    pub fn label(&self, granularity: Granularity, index: usize) -> Option<&Value> {
        self.points(granularity).get(index).and_then(|p| p.get("x"))
    }
}

/// The four pivot tables shown on the overview
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PivotSet {
    pub electricity: PivotTable,
    pub co2: PivotTable,
    pub water: PivotTable,
    pub vehicle: PivotTable,
}

impl PivotSet {
    pub fn get(&self, domain: Domain) -> &PivotTable {
        match domain {
            Domain::Electricity => &self.electricity,
            Domain::Co2 => &self.co2,
            Domain::Water => &self.water,
            Domain::Vehicle => &self.vehicle,
        }
    }

    pub fn set(&mut self, domain: Domain, table: PivotTable) {
        match domain {
            Domain::Electricity => self.electricity = table,
            Domain::Co2 => self.co2 = table,
            Domain::Water => self.water = table,
            Domain::Vehicle => self.vehicle = table,
        }
    }
}

/// A remote path the dashboard subscribes to, tagged with the kind of
/// payload it carries
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feed {
    Cards(ViewKey),
    Chart,
    DailyChart(ViewKey),
    Pivot(Domain),
    Co2Gauge,
}

impl Feed {
    pub fn path(&self) -> String {
        match self {
            Feed::Cards(view) => format!("cards/{}", view.segment()),
            Feed::Chart => "charts/ELECTRICITY".to_string(),
            Feed::DailyChart(ViewKey::Electricity) => "charts/ELECTRICITY_DAILY_POWER".to_string(),
            Feed::DailyChart(ViewKey::VehicleCounter) => "charts/VEHICLE_DAILY_COUNT".to_string(),
            Feed::DailyChart(view) => format!("charts/{}_DAILY", view.segment()),
            Feed::Pivot(domain) => domain.pivot_path().to_string(),
            Feed::Co2Gauge => "cards/CO2/card25".to_string(),
        }
    }

    /// The feeds a view needs while it is active
    ///
    /// # Arguments
    ///
    /// * 'view' - the active view
    pub fn for_view(view: ViewKey) -> Vec<Feed> {
        let mut feeds = vec![Feed::Cards(view)];
        match view {
            ViewKey::Overview => {
                feeds.push(Feed::Co2Gauge);
                feeds.extend(Domain::ALL.iter().map(|d| Feed::Pivot(*d)));
            }
            ViewKey::Electricity => {
                feeds.push(Feed::Chart);
                feeds.push(Feed::DailyChart(view));
            }
            ViewKey::Co2 | ViewKey::VehicleCounter => feeds.push(Feed::DailyChart(view)),
            ViewKey::Water => (),
        }
        feeds
    }
}
