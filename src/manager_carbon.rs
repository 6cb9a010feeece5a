use serde::Serialize;
use serde_json::Value;
use crate::models::{Granularity, PivotTable};
use crate::numeric::{display_number, serialize_finite};

/// Ton CO2 per unit of electricity
pub const ELECTRICITY_FACTOR: f64 = 0.29;
/// Ton CO2 per counted car
pub const CAR_FACTOR: f64 = 0.1842 / 1000.0;
/// Ton CO2 per counted motorcycle
pub const MOTORCYCLE_FACTOR: f64 = 0.0555 / 1000.0;

/// Granularity the cumulative totals are summed over
pub const TOTALS_GRANULARITY: Granularity = Granularity::Month;

/// Equivalences per ton CO2: name, multiplier, display decimals
const EQUIVALENCES: [(&str, f64, usize); 7] = [
    ("waste_recycled_tons", 0.35, 2),
    ("trash_bags_recycled", 43.3, 0),
    ("garbage_trucks_recycled", 0.174, 2),
    ("wind_turbines_year", 0.0003, 2),
    ("tree_seedlings_10_years", 16.5, 0),
    ("forest_acres_year", 1.2, 2),
    ("forest_acres_preserved", 0.007, 2),
];

const METER_MAX: f64 = 1000.0;
const METER_THRESHOLDS: [(f64, &str, &str); 4] = [
    (450.0, "Excellent", "#5BE12C"),
    (600.0, "Fair", "#F5CD19"),
    (800.0, "Mediocre", "#F58B19"),
    (1000.0, "Bad", "#EA4228"),
];

/// Carbon footprint at one chart index
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CarbonPoint {
    pub x: Value,
    #[serde(serialize_with = "serialize_finite")]
    pub electricity: f64,
    #[serde(serialize_with = "serialize_finite")]
    pub car: f64,
    #[serde(serialize_with = "serialize_finite")]
    pub motorcycle: f64,
}

/// Cumulative carbon totals in ton CO2, NaN is kept until display
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarbonTotals {
    pub electricity: f64,
    pub car: f64,
    pub motorcycle: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Equivalence {
    pub name: &'static str,
    pub value: String,
}

/// Carbon figures as shown on the overview
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CarbonSummary {
    pub total_electricity: String,
    pub total_car: String,
    pub total_motorcycle: String,
    pub total: String,
    pub equivalences: Vec<Equivalence>,
}

/// Position of a CO2 reading on the analog meter
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Co2Meter {
    pub ppm: String,
    pub label: &'static str,
    pub color: &'static str,
    pub fill_percent: String,
}

/// Returns the carbon series of the given granularity, one point per index present in
/// either table. A missing source point contributes zero
///
/// # Arguments
///
/// * 'electricity' - electricity pivot table, field y1 is consumption
/// * 'vehicle' - vehicle pivot table, fields y3 and y4 are car and motorcycle counts
/// * 'granularity' - granularity to read
pub fn carbon_series(electricity: &PivotTable, vehicle: &PivotTable, granularity: Granularity) -> Vec<CarbonPoint> {
    let len = electricity.points(granularity).len().max(vehicle.points(granularity).len());

    (0..len)
        .map(|i| CarbonPoint {
            x: electricity.label(granularity, i)
                .or_else(|| vehicle.label(granularity, i))
                .cloned()
                .unwrap_or(Value::Null),
            electricity: electricity.field(granularity, i, "y1") * ELECTRICITY_FACTOR,
            car: vehicle.field(granularity, i, "y3") * CAR_FACTOR,
            motorcycle: vehicle.field(granularity, i, "y4") * MOTORCYCLE_FACTOR,
        })
        .collect()
}

/// Sums a granularity's whole sequence per source and applies the emission factors
///
/// # Arguments
///
/// * 'electricity' - electricity pivot table
/// * 'vehicle' - vehicle pivot table
/// * 'granularity' - granularity to sum over, normally month
pub fn carbon_totals(electricity: &PivotTable, vehicle: &PivotTable, granularity: Granularity) -> CarbonTotals {
    let sum = |table: &PivotTable, field: &str| -> f64 {
        (0..table.points(granularity).len())
            .map(|i| table.field(granularity, i, field))
            .fold(0.0, |acc, v| acc + v)
    };

    let electricity = sum(electricity, "y1") * ELECTRICITY_FACTOR;
    let car = sum(vehicle, "y3") * CAR_FACTOR;
    let motorcycle = sum(vehicle, "y4") * MOTORCYCLE_FACTOR;

    CarbonTotals { electricity, car, motorcycle, total: electricity + car + motorcycle }
}

/// Formats totals and their equivalences for display, NaN shows as "0"
///
/// # Arguments
///
/// * 'totals' - the carbon totals
pub fn summarize(totals: &CarbonTotals) -> CarbonSummary {
    CarbonSummary {
        total_electricity: display_number(totals.electricity, 2),
        total_car: display_number(totals.car, 2),
        total_motorcycle: display_number(totals.motorcycle, 2),
        total: display_number(totals.total, 2),
        equivalences: EQUIVALENCES.iter()
            .map(|&(name, factor, decimals)| Equivalence {
                name,
                value: display_number(totals.total * factor, decimals),
            })
            .collect(),
    }
}

/// Places a CO2 concentration on the 0 to 1000 ppm analog meter
///
/// # Arguments
///
/// * 'ppm' - the concentration
pub fn co2_meter(ppm: f64) -> Co2Meter {
    let (_, label, color) = METER_THRESHOLDS.iter()
        .find(|(limit, _, _)| ppm <= *limit)
        .copied()
        .unwrap_or(METER_THRESHOLDS[METER_THRESHOLDS.len() - 1]);

    Co2Meter {
        ppm: display_number(ppm, 2),
        label,
        color,
        fill_percent: display_number((ppm / METER_MAX * 100.0).clamp(0.0, 100.0), 1),
    }
}
