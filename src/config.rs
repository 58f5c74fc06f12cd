use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::models::{DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Length assumed for timed classes whose text gives no end time.
    pub default_duration_minutes: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://classes.db?mode=rwc".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_connections: 5,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let bind_addr = parse_var("BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let max_connections = parse_var("DB_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections);
        let default_duration_minutes =
            parse_var("DEFAULT_DURATION_MINUTES")?.unwrap_or(defaults.default_duration_minutes);

        if !(1..=MAX_DURATION_MINUTES).contains(&default_duration_minutes) {
            return Err(AppError::BadRequest(format!(
                "DEFAULT_DURATION_MINUTES must be between 1 and {}",
                MAX_DURATION_MINUTES
            )));
        }

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            default_duration_minutes,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} is not valid: {}", key, raw))),
        Err(_) => Ok(None),
    }
}
