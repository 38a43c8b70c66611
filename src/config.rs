use lazy_static::lazy_static;
use regex::Regex;
use std::env;

lazy_static! {
    // "7d", "12h", "30m", "45s" or a bare number of seconds
    static ref DURATION_REGEX: Regex = Regex::new(r"^\s*(\d+)\s*([dhms]?)\s*$").unwrap();
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_expiration: chrono::Duration,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let jwt_expire = lookup("JWT_EXPIRE").unwrap_or_else(|| "7d".to_string());
        let jwt_expiration = parse_duration(&jwt_expire).ok_or(ConfigError::Invalid {
            name: "JWT_EXPIRE",
            value: jwt_expire.clone(),
        })?;

        let environment = match lookup("APP_ENV").as_deref() {
            Some(value) if value.eq_ignore_ascii_case("development") => Environment::Development,
            _ => Environment::Production,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", &lookup, 5)?,
            server_port: parse_or("SERVER_PORT", &lookup, 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration,
            environment,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// Parses a token lifetime such as `7d` or `3600`. Zero is rejected.
pub fn parse_duration(value: &str) -> Option<chrono::Duration> {
    let captures = DURATION_REGEX.captures(value)?;
    let amount: i64 = captures[1].parse().ok()?;
    if amount == 0 {
        return None;
    }

    match &captures[2] {
        "d" => chrono::Duration::try_days(amount),
        "h" => chrono::Duration::try_hours(amount),
        "m" => chrono::Duration::try_minutes(amount),
        _ => chrono::Duration::try_seconds(amount),
    }
}
