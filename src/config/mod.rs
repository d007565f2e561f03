//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// WebSocket URL of the hub (`ws://` or `wss://`)
    pub hub_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Display name announced in every snapshot
    pub player_name: String,

    /// Downward acceleration applied to airborne bodies (m/s²)
    pub gravity: f32,
    /// Frame loop rate for the headless client
    pub frame_rate: u32,
    /// Number of pooled dynamic spheres
    pub sphere_count: usize,
    /// Seed for the simulation RNG (shot tags)
    pub sim_seed: u64,

    /// Stop the session when the hub is silent this long; `None` disables the watchdog
    pub hub_silence_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hub_url = lookup("HUB_URL").unwrap_or_else(|| "ws://127.0.0.1:9000".to_string());
        if !(hub_url.starts_with("ws://") || hub_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl);
        }

        let silence_ms: u64 = parse_or(&lookup, "HUB_SILENCE_TIMEOUT_MS", 0)?;
        let sim_seed = match lookup("SIM_SEED") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("SIM_SEED"))?,
            None => rand::random(),
        };

        let frame_rate: u32 = parse_or(&lookup, "FRAME_RATE", 60)?;
        if frame_rate == 0 {
            return Err(ConfigError::Invalid("FRAME_RATE"));
        }

        Ok(Self {
            hub_url,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,
            player_name: lookup("PLAYER_NAME").unwrap_or_else(|| "Your Name".to_string()),

            gravity: parse_or(&lookup, "GRAVITY", 9.8)?,
            frame_rate,
            sphere_count: parse_or(&lookup, "SPHERE_COUNT", 8)?,
            sim_seed,

            hub_silence_timeout: (silence_ms > 0).then(|| Duration::from_millis(silence_ms)),
        })
    }

    /// Duration of one frame of the headless frame loop
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate as f64)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::Invalid("LOG_FORMAT")),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid hub URL, expected ws:// or wss://")]
    InvalidUrl,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.hub_url, "ws://127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.player_name, "Your Name");
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.sphere_count, 8);
        assert!((config.gravity - 9.8).abs() < f32::EPSILON);
        assert!(config.hub_silence_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("HUB_URL", "wss://hub.example.net/game"),
            ("LOG_FORMAT", "JSON"),
            ("PLAYER_NAME", "ada"),
            ("GRAVITY", "30"),
            ("SIM_SEED", "42"),
            ("HUB_SILENCE_TIMEOUT_MS", "2500"),
        ]))
        .unwrap();
        assert_eq!(config.hub_url, "wss://hub.example.net/game");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.player_name, "ada");
        assert_eq!(config.gravity, 30.0);
        assert_eq!(config.sim_seed, 42);
        assert_eq!(config.hub_silence_timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[("GRAVITY", "heavy")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("GRAVITY")));

        let err = Config::from_lookup(lookup_from(&[("FRAME_RATE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("FRAME_RATE")));

        let err = Config::from_lookup(lookup_from(&[("HUB_URL", "127.0.0.1:9000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl));

        let err = Config::from_lookup(lookup_from(&[("LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("LOG_FORMAT")));
    }
}
