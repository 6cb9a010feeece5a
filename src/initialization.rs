use std::fs;
use serde::Deserialize;
use crate::errors::UnrecoverableError;
use crate::logging::setup_logger;

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Deserialize, Clone)]
pub struct General {
    pub log_path: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Clone)]
pub struct WebServer {
    pub bind_address: String,
    pub bind_port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct Realtime {
    pub database_url: String,
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct WeatherApi {
    pub host: String,
    pub api_key: String,
    pub location: String,
}

#[derive(Deserialize, Clone)]
pub struct Co2Reference {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct Files {
    pub cache_dir: String,
    pub backup_dir: String,
}

/// Timer periods of the view cycle and its companions
///
#[derive(Deserialize, Clone)]
pub struct Cycle {
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
    #[serde(default = "default_export_check_secs")]
    pub export_check_secs: u64,
    #[serde(default = "default_highlight_millis")]
    pub highlight_millis: u64,
}

impl Default for Cycle {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            pause_secs: default_pause_secs(),
            export_check_secs: default_export_check_secs(),
            highlight_millis: default_highlight_millis(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub general: General,
    pub web_server: WebServer,
    pub realtime: Realtime,
    pub weather: WeatherApi,
    pub co2_reference: Co2Reference,
    pub files: Files,
    #[serde(default)]
    pub cycle: Cycle,
}

/// Loads the configuration file given by '--config=<path>' and sets up logging
///
pub fn config() -> Result<Config, UnrecoverableError> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.iter()
        .find_map(|a| a.strip_prefix("--config="))
        .unwrap_or(DEFAULT_CONFIG);

    let text = fs::read_to_string(config_path)
        .map_err(|e| UnrecoverableError(format!("unable to read config {}: {}", config_path, e)))?;
    let config = parse_config(&text)?;

    setup_logger(config.general.log_path.as_deref(), &config.general.log_level, config.general.log_to_stdout)?;

    Ok(config)
}

/// Parses the toml text of a configuration file
///
/// # Arguments
///
/// * 'text' - the toml document
pub fn parse_config(text: &str) -> Result<Config, UnrecoverableError> {
    let mut config: Config = toml::from_str(text)?;

    for dir in [&mut config.files.cache_dir, &mut config.files.backup_dir] {
        if !dir.is_empty() && !dir.ends_with('/') {
            dir.push('/');
        }
    }

    Ok(config)
}

fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }
fn default_static_dir() -> String { "./static".to_string() }
fn default_reconnect_secs() -> u64 { 5 }
fn default_tick_secs() -> u64 { 300 }
fn default_pause_secs() -> u64 { 120 }
fn default_export_check_secs() -> u64 { 60 }
fn default_highlight_millis() -> u64 { 1000 }

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[general]
log_path = "green.log"

[web_server]
bind_address = "127.0.0.1"
bind_port = 8080

[realtime]
database_url = "https://example-rtdb.firebasedatabase.app"

[weather]
host = "api.weatherapi.com"
api_key = "secret"
location = "-7.052,110.428"

[co2_reference]
url = "https://gml.noaa.gov/webdata/ccgg/trends/co2/co2_trend_gl.txt"

[files]
cache_dir = "/tmp/green"
backup_dir = "/tmp/green/backup/"
"#;

    #[test]
    fn cycle_defaults_apply_when_section_is_missing() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.cycle.tick_secs, 300);
        assert_eq!(config.cycle.pause_secs, 120);
        assert_eq!(config.cycle.export_check_secs, 60);
        assert_eq!(config.cycle.highlight_millis, 1000);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.web_server.static_dir, "./static");
    }

    #[test]
    fn directories_get_trailing_separator() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.files.cache_dir, "/tmp/green/");
        assert_eq!(config.files.backup_dir, "/tmp/green/backup/");
    }

    #[test]
    fn partial_cycle_section_keeps_other_defaults() {
        let text = format!("{}\n[cycle]\ntick_secs = 20\n", MINIMAL);
        let config = parse_config(&text).unwrap();
        assert_eq!(config.cycle.tick_secs, 20);
        assert_eq!(config.cycle.pause_secs, 120);
    }

    #[test]
    fn broken_toml_is_unrecoverable() {
        assert!(parse_config("[general\nlog_level=").is_err());
    }
}
