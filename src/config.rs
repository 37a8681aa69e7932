use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Process settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub prometheus_url: String,
    pub config_path: PathBuf,
    pub calc_interval: Duration,
    pub query_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 9193,
            prometheus_url: "http://127.0.0.1:9090".to_string(),
            config_path: PathBuf::from("data/metric_comparison_cache.json"),
            calc_interval: Duration::from_secs(10),
            query_timeout: Duration::from_secs(5),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            prometheus_url: lookup("PROMETHEUS_URL").unwrap_or(defaults.prometheus_url),
            config_path: lookup("COMPARISON_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            calc_interval: Duration::from_secs(parse_or(
                "CALC_INTERVAL_SECS",
                lookup("CALC_INTERVAL_SECS"),
                defaults.calc_interval.as_secs(),
            ).max(1)),
            query_timeout: Duration::from_secs(parse_or(
                "QUERY_TIMEOUT_SECS",
                lookup("QUERY_TIMEOUT_SECS"),
                defaults.query_timeout.as_secs(),
            ).max(1)),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "invalid setting, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(settings(&[]), Settings::default());
        assert_eq!(Settings::default().listen_addr(), "0.0.0.0:9193");
    }

    #[test]
    fn overrides_from_environment() {
        let s = settings(&[
            ("PORT", "8181"),
            ("PROMETHEUS_URL", "http://prom:9090"),
            ("COMPARISON_CONFIG_PATH", "/var/lib/cmp.json"),
            ("CALC_INTERVAL_SECS", "30"),
            ("QUERY_TIMEOUT_SECS", "2"),
        ]);
        assert_eq!(s.port, 8181);
        assert_eq!(s.prometheus_url, "http://prom:9090");
        assert_eq!(s.config_path, PathBuf::from("/var/lib/cmp.json"));
        assert_eq!(s.calc_interval, Duration::from_secs(30));
        assert_eq!(s.query_timeout, Duration::from_secs(2));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let s = settings(&[("PORT", "http"), ("CALC_INTERVAL_SECS", "0")]);
        assert_eq!(s.port, 9193);
        assert_eq!(s.calc_interval, Duration::from_secs(1));
    }
}
