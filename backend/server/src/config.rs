use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow, ensure};
use axum::http::HeaderValue;
use tracing::{info, warn};

const DEFAULT_ORIGINS: &str = "http://127.0.0.1:5174,http://localhost:5174,https://dojodraw.netlify.app";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub store_backend: StoreBackend,
    pub allowed_origins: Vec<HeaderValue>,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    /// Hour of the day (UTC) the scheduled draw runs.
    pub draw_hour: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut redis_url: String = try_load("REDIS_URL", "redis://127.0.0.1:6379")?;
        if let Some(password) = read_secret("REDIS_PASSWORD") {
            redis_url = with_password(&redis_url, &password);
        }

        let origins: String = try_load("ALLOWED_ORIGINS", DEFAULT_ORIGINS)?;
        let draw_hour = try_load("DRAW_HOUR_UTC", "0")?;
        ensure!(draw_hour < 24, "DRAW_HOUR_UTC must be between 0 and 23");

        Ok(Self {
            port: try_load("RUST_PORT", "3000")?,
            redis_url,
            store_backend: try_load("STORE_BACKEND", "redis")?,
            allowed_origins: parse_origins(&origins)?,
            session_ttl: Duration::from_secs(try_load("SESSION_TTL_SECS", "2592000")?),
            secure_cookies: try_load("SECURE_COOKIES", "false")?,
            draw_hour,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_backend: StoreBackend::Memory,
            allowed_origins: Vec::new(),
            session_ttl: Duration::from_secs(60 * 60),
            secure_cookies: false,
            draw_hour: 0,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
}

fn with_password(redis_url: &str, password: &str) -> String {
    match redis_url.split_once("://") {
        Some((scheme, rest)) if !rest.contains('@') => format!("{scheme}://:{password}@{rest}"),
        _ => redis_url.to_string(),
    }
}

fn parse_origins(origins: &str) -> Result<Vec<HeaderValue>> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid origin {origin}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_password() {
        assert_eq!(
            with_password("redis://cache:6379", "hunter2"),
            "redis://:hunter2@cache:6379"
        );
        assert_eq!(
            with_password("redis://:other@cache:6379", "hunter2"),
            "redis://:other@cache:6379"
        );
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" http://localhost:5174 , https://dojodraw.netlify.app,").unwrap();

        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:5174");
    }

    #[test]
    fn test_store_backend() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("redis".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }
}
