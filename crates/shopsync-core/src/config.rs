use std::convert::TryFrom;
use std::path::PathBuf;

/// Everything needed to address and authenticate against one tenant.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub shop_domain: String,
    pub admin_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: TenantConfig,
    pub destination: TenantConfig,
    pub api_version: String,
    pub output_dir: PathBuf,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    pub bulk_poll_interval: std::time::Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("{0}")]
    Invalid(String),
}

impl Config {
    /// Reads the full configuration from the process environment. This is the
    /// seam a CLI front-end or dotfile loader would populate before calling in;
    /// neither is implemented here (see spec's Out of scope).
    pub fn from_env() -> Result<Self, ConfigError> {
        let source = TenantConfig {
            shop_domain: require_env("SRC_SHOP_DOMAIN")?,
            admin_token: require_env("SRC_ADMIN_TOKEN")?,
        };
        let destination = TenantConfig {
            shop_domain: require_env("DST_SHOP_DOMAIN")?,
            admin_token: require_env("DST_ADMIN_TOKEN")?,
        };
        let api_version =
            std::env::var("SHOPIFY_API_VERSION").unwrap_or_else(|_| "2025-10".to_string());
        let output_dir = std::env::var("OUTPUT_DIR")
            .unwrap_or_else(|_| "./dump".to_string())
            .into();
        let log_level: LogLevel = std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .try_into()
            .map_err(ConfigError::Invalid)?;
        let log_format: LogFormat = std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .try_into()
            .map_err(ConfigError::Invalid)?;
        let bulk_poll_interval = std::env::var("BULK_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(std::time::Duration::from_millis)
            .unwrap_or(std::time::Duration::from_secs(1));

        Ok(Config {
            source,
            destination,
            api_version,
            output_dir,
            log_level,
            log_format,
            bulk_poll_interval,
        })
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("{other} is not a known log level")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Structured,
}

impl TryFrom<String> for LogFormat {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "structured" | "json" => Ok(LogFormat::Structured),
            other => Err(format!("{other} is not a known log format")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!(LogLevel::try_from("WARN".to_string()).unwrap(), LogLevel::Warn);
        assert!(LogLevel::try_from("bogus".to_string()).is_err());
    }

    #[test]
    fn log_format_accepts_json_alias() {
        assert_eq!(
            LogFormat::try_from("json".to_string()).unwrap(),
            LogFormat::Structured
        );
    }
}
