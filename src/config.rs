use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Longest accepted session lifetime, in days.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub static_dir: PathBuf,

    // Feed
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub max_comment_length: usize,

    // Sessions
    pub session_ttl: chrono::Duration,
    pub session_cleanup_interval: Duration,
    pub cookie_secure: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default, so an empty environment yields a usable
    /// development configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/ideas.sqlite")),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 3000)?,
            static_dir: PathBuf::from(env_or_default("STATIC_DIR", "./public")),

            // Feed
            default_page_limit: parse_env_u32("DEFAULT_PAGE_LIMIT", 10)?,
            max_page_limit: parse_env_u32("MAX_PAGE_LIMIT", 100)?,
            max_comment_length: parse_env_usize("MAX_COMMENT_LENGTH", 2000)?,

            // Sessions
            session_ttl: parse_env_days("SESSION_TTL_DAYS", 7)?,
            session_cleanup_interval: Duration::from_secs(parse_env_u64(
                "SESSION_CLEANUP_INTERVAL_SECS",
                3600,
            )?),
            cookie_secure: parse_env_bool("COOKIE_SECURE", false)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_limit == 0 {
            return Err(invalid("DEFAULT_PAGE_LIMIT", "must be at least 1"));
        }
        if self.max_page_limit == 0 {
            return Err(invalid("MAX_PAGE_LIMIT", "must be at least 1"));
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(invalid(
                "DEFAULT_PAGE_LIMIT",
                &format!("cannot exceed MAX_PAGE_LIMIT ({})", self.max_page_limit),
            ));
        }
        if self.max_comment_length == 0 {
            return Err(invalid("MAX_COMMENT_LENGTH", "must be at least 1"));
        }
        if self.session_ttl <= chrono::Duration::zero() {
            return Err(invalid("SESSION_TTL_DAYS", "must be at least 1"));
        }
        if self.session_ttl > chrono::Duration::days(MAX_SESSION_TTL_DAYS) {
            return Err(invalid(
                "SESSION_TTL_DAYS",
                &format!("cannot exceed {MAX_SESSION_TTL_DAYS}"),
            ));
        }
        if self.session_cleanup_interval.is_zero() {
            return Err(invalid("SESSION_CLEANUP_INTERVAL_SECS", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.trim().parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    parse_env(name, default)
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, ConfigError> {
    parse_env(name, default)
}

fn parse_env_days(name: &str, default: i64) -> Result<chrono::Duration, ConfigError> {
    let days = parse_env_i64(name, default)?;
    chrono::Duration::try_days(days).ok_or_else(|| invalid(name, "out of range"))
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    parse_env(name, default)
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    parse_env(name, default)
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    parse_env(name, default)
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_defaults() {
        assert!(parse_env_bool("IDEA_BOARD_NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("IDEA_BOARD_NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_parse_int_defaults() {
        assert_eq!(parse_env_u32("IDEA_BOARD_NONEXISTENT_VAR", 10).unwrap(), 10);
        assert_eq!(parse_env_i64("IDEA_BOARD_NONEXISTENT_VAR", 7).unwrap(), 7);
        assert_eq!(
            parse_env_days("IDEA_BOARD_NONEXISTENT_VAR", 7).unwrap(),
            chrono::Duration::days(7)
        );
    }
}
