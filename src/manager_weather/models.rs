use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ForecastResponse {
    pub error: Option<ApiError>,
    pub location: Option<Location>,
    pub current: Option<Current>,
    pub forecast: Option<Forecast>,
}

#[derive(Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
}

#[derive(Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

#[derive(Deserialize)]
pub struct Current {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: f64,
    pub cloud: f64,
    pub condition: Condition,
}

#[derive(Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Deserialize)]
pub struct ForecastDay {
    pub day: Day,
}

#[derive(Deserialize)]
pub struct Day {
    pub daily_chance_of_rain: f64,
}

/// Current weather as displayed on the overview
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub icon: String,
    pub condition: String,
    pub temp: f64,
    pub feelslike: f64,
    pub humidity: f64,
    pub cloud: f64,
    pub rain_chance: f64,
}
