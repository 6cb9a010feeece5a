pub mod errors;
pub mod models;

use std::time::Duration;
use reqwest::Client;
use crate::manager_weather::errors::WeatherError;
use crate::manager_weather::models::{ForecastResponse, WeatherReport};

/// Weather manager
/// 
pub struct Weather {
    client: Client,
    host: String,
    api_key: String,
    location: String,
}

impl Weather {

    /// Returns a new instance of Weather
    /// 
    /// # Arguments
    /// 
    /// * 'host' - host of the forecast API, e.g. "api.weatherapi.com"
    /// * 'api_key' - key for the forecast API
    /// * 'location' - location to report for, e.g. "-7.05,110.43" or a city name
    pub fn new(host: &str, api_key: &str, location: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        
        Ok(Self {
            client,
            host: host.to_string(),
            api_key: api_key.to_string(),
            location: location.to_string(),
        })
    }
    
    /// Returns current conditions and today's chance of rain
    /// 
    pub async fn get_report(&self) -> Result<WeatherReport, WeatherError> {
        let url = format!("https://{}/v1/forecast.json", self.host);

        let req = self.client.get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", self.location.as_str()),
                ("days", "1"),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send().await?;

        // the API reports failures with an error object, also on non success status
        let json = req.text().await?;
        transform_forecast(serde_json::from_str(&json)?)
    }
}

/// Picks the displayed fields out of a forecast response
///
/// # Arguments
///
/// * 'res' - the deserialized response
fn transform_forecast(res: ForecastResponse) -> Result<WeatherReport, WeatherError> {
    if let Some(error) = res.error {
        return Err(WeatherError::Api(error.message));
    }

    let location = res.location.ok_or("forecast without location")?;
    let current = res.current.ok_or("forecast without current conditions")?;
    let rain_chance = res.forecast
        .and_then(|f| f.forecastday.into_iter().next())
        .map(|d| d.day.daily_chance_of_rain)
        .ok_or("forecast without days")?;

    Ok(WeatherReport {
        city: location.name,
        country: location.country,
        icon: format!("https:{}", current.condition.icon),
        condition: current.condition.text,
        temp: current.temp_c,
        feelslike: current.feelslike_c,
        humidity: current.humidity,
        cloud: current.cloud,
        rain_chance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORECAST: &str = r#"{
        "location": {"name": "Semarang", "country": "Indonesia", "lat": -6.97},
        "current": {
            "temp_c": 31.2, "feelslike_c": 36.5, "humidity": 66, "cloud": 50,
            "condition": {"text": "Partly cloudy", "icon": "//cdn.weatherapi.com/weather/64x64/day/116.png", "code": 1003}
        },
        "forecast": {"forecastday": [{"date": "2026-10-18", "day": {"daily_chance_of_rain": 87}}]}
    }"#;

    #[test]
    fn forecast_is_reduced_to_the_report() {
        let report = transform_forecast(serde_json::from_str(FORECAST).unwrap()).unwrap();
        assert_eq!(report.city, "Semarang");
        assert_eq!(report.icon, "https://cdn.weatherapi.com/weather/64x64/day/116.png");
        assert_eq!(report.temp, 31.2);
        assert_eq!(report.humidity, 66.0);
        assert_eq!(report.rain_chance, 87.0);
    }

    #[test]
    fn error_object_is_a_failure() {
        let body = r#"{"error": {"code": 2006, "message": "API key is invalid."}}"#;
        let err = transform_forecast(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, WeatherError::Api(msg) if msg == "API key is invalid."));
    }

    #[test]
    fn missing_forecast_days_is_a_failure() {
        let body = FORECAST.replace(r#"[{"date": "2026-10-18", "day": {"daily_chance_of_rain": 87}}]"#, "[]");
        assert!(transform_forecast(serde_json::from_str(&body).unwrap()).is_err());
    }
}
