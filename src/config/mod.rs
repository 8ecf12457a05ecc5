use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::checkin::DEFAULT_DISPLAY_WINDOW;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_DATABASE_URL: &str = "sqlite://checkin.db";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ticketing backend.
    pub api_base_url: String,
    /// Local cache database.
    pub database_url: String,
    pub port: u16,
    /// How long a scan result stays on screen.
    pub display_window: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("CHECKIN_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            port: parse_var("CHECKIN_PORT", DEFAULT_PORT),
            display_window: Duration::from_millis(parse_var(
                "CHECKIN_DISPLAY_WINDOW_MS",
                DEFAULT_DISPLAY_WINDOW.as_millis() as u64,
            )),
            request_timeout: Duration::from_secs(parse_var(
                "CHECKIN_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            display_window: DEFAULT_DISPLAY_WINDOW,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Config: Invalid {} value '{}': {}, using {}", key, raw, e, default);
            default
        }),
        Err(_) => default,
    }
}
