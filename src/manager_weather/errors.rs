use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub enum WeatherError {
    /// The request didn't get through
    Request(String),
    /// The API answered with an error object
    Api(String),
    /// The answer lacks what the report needs
    Document(String),
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::Request(e)  => write!(f, "WeatherError::Request: {}", e),
            WeatherError::Api(e)      => write!(f, "WeatherError::Api: {}", e),
            WeatherError::Document(e) => write!(f, "WeatherError::Document: {}", e),
        }
    }
}
impl From<&str> for WeatherError {
    fn from(e: &str) -> Self { WeatherError::Document(e.to_string()) }
}
impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self { WeatherError::Request(e.to_string()) }
}
impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self { WeatherError::Document(e.to_string()) }
}
