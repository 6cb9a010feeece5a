use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub struct Co2RefError(pub String);
impl fmt::Display for Co2RefError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Co2RefError: {}", self.0)
    }
}
impl From<&str> for Co2RefError {
    fn from(e: &str) -> Self { Co2RefError(e.to_string()) }
}
impl From<reqwest::Error> for Co2RefError {
    fn from(e: reqwest::Error) -> Self { Co2RefError(e.to_string()) }
}
impl From<std::io::Error> for Co2RefError {
    fn from(e: std::io::Error) -> Self { Co2RefError(e.to_string()) }
}
