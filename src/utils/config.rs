use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::api::YahooClient;

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub analysis_port: u16,
    pub compare_port: u16,
    pub static_dir: PathBuf,
    pub chart_retention: usize,
    pub yahoo_base_url: String,
    pub provider_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            analysis_port: 5000,
            compare_port: 4000,
            static_dir: PathBuf::from("static"),
            chart_retention: 50,
            yahoo_base_url: YahooClient::DEFAULT_BASE_URL.to_string(),
            provider_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults, malformed ones are logged
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: parse_or("HOST", &lookup, defaults.host),
            analysis_port: parse_or("ANALYSIS_PORT", &lookup, defaults.analysis_port),
            compare_port: parse_or("COMPARE_PORT", &lookup, defaults.compare_port),
            static_dir: lookup("STATIC_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            chart_retention: parse_or("CHART_RETENTION", &lookup, defaults.chart_retention),
            yahoo_base_url: lookup("YAHOO_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.yahoo_base_url),
            provider_timeout: Duration::from_secs(parse_or(
                "PROVIDER_TIMEOUT_SECS",
                &lookup,
                defaults.provider_timeout.as_secs(),
            )),
        }
    }

    pub fn analysis_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.analysis_port)
    }

    pub fn compare_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.compare_port)
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}='{}', using default", key, raw);
                default
            }
        },
        None => default,
    }
}
