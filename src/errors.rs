use std::fmt;
use std::fmt::Formatter;

/// Errors that stop the process during startup
///
#[derive(Debug)]
pub struct UnrecoverableError(pub String);
impl fmt::Display for UnrecoverableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UnrecoverableError: {}", self.0)
    }
}
impl From<&str> for UnrecoverableError {
    fn from(e: &str) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<String> for UnrecoverableError {
    fn from(e: String) -> Self { UnrecoverableError(e) }
}
impl From<std::io::Error> for UnrecoverableError {
    fn from(e: std::io::Error) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<toml::de::Error> for UnrecoverableError {
    fn from(e: toml::de::Error) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<log::SetLoggerError> for UnrecoverableError {
    fn from(e: log::SetLoggerError) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for UnrecoverableError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<crate::manager_realtime::errors::RealtimeError> for UnrecoverableError {
    fn from(e: crate::manager_realtime::errors::RealtimeError) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<crate::manager_weather::errors::WeatherError> for UnrecoverableError {
    fn from(e: crate::manager_weather::errors::WeatherError) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<crate::manager_co2_reference::errors::Co2RefError> for UnrecoverableError {
    fn from(e: crate::manager_co2_reference::errors::Co2RefError) -> Self { UnrecoverableError(e.to_string()) }
}
