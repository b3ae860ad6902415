//! Environment-driven configuration.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::alert::permission::Permission;
use crate::error::AppError;
use crate::task::arrival_poller::DEFAULT_POLL_INTERVAL;

/// Runtime configuration for the notifier.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the bus-info REST API, without trailing slash.
    pub api_url: String,
    /// User whose subscriptions are watched. The poller stays disarmed when absent.
    pub user_id: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Maximum arrival requests per second.
    pub arrivals_rate_limit: u32,
    /// Target of the native notification channel.
    pub webhook_url: Option<String>,
    pub notification_permission: Permission,
    pub logs_path: PathBuf,
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            user_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(10),
            arrivals_rate_limit: 5,
            webhook_url: None,
            notification_permission: Permission::Default,
            logs_path: PathBuf::from("./logs"),
        }
    }

    /// Overrides defaults with values from the process environment.
    pub fn load(&mut self) -> Result<(), AppError> {
        if let Some(api_url) = Self::var("API_URL") {
            self.api_url = api_url.trim_end_matches('/').to_string();
        }
        self.user_id = Self::var("USER_ID");
        if let Some(secs) = Self::parse_var::<u64>("POLL_INTERVAL")? {
            self.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = Self::parse_var::<u64>("REQUEST_TIMEOUT")? {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = Self::parse_var::<u32>("ARRIVALS_RATE_LIMIT")? {
            if limit == 0 {
                return Err(AppError::InvalidConfig {
                    key: "ARRIVALS_RATE_LIMIT".to_string(),
                    value: limit.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            self.arrivals_rate_limit = limit;
        }
        self.webhook_url = Self::var("WEBHOOK_URL");
        if let Some(permission) = Self::parse_var::<Permission>("NOTIFICATION_PERMISSION")? {
            self.notification_permission = permission;
        }
        if let Some(logs_path) = Self::var("LOGS_PATH") {
            self.logs_path = PathBuf::from(logs_path);
        }
        Ok(())
    }

    /// Reads a variable, treating blank values as unset.
    fn var(key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_var<T>(key: &str) -> Result<Option<T>, AppError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match Self::var(key) {
            None => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|e| AppError::InvalidConfig {
                key: key.to_string(),
                reason: e.to_string(),
                value,
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 8] = [
        "API_URL",
        "USER_ID",
        "POLL_INTERVAL",
        "REQUEST_TIMEOUT",
        "ARRIVALS_RATE_LIMIT",
        "WEBHOOK_URL",
        "NOTIFICATION_PERMISSION",
        "LOGS_PATH",
    ];

    fn clear_env() {
        for key in KEYS {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_defaults_without_env() {
        clear_env();
        let mut config = Config::new();
        config.load().unwrap();

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.user_id, None);
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.notification_permission, Permission::Default);
    }

    #[test]
    #[serial_test::serial]
    fn test_load_overrides() {
        clear_env();
        unsafe {
            env::set_var("API_URL", "https://bus.example.com/");
            env::set_var("USER_ID", "42");
            env::set_var("POLL_INTERVAL", "30");
            env::set_var("NOTIFICATION_PERMISSION", "granted");
            env::set_var("WEBHOOK_URL", "  ");
        }
        let mut config = Config::new();
        config.load().unwrap();
        clear_env();

        assert_eq!(config.api_url, "https://bus.example.com");
        assert_eq!(config.user_id.as_deref(), Some("42"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.notification_permission, Permission::Granted);
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    #[serial_test::serial]
    fn test_invalid_number_is_rejected() {
        clear_env();
        unsafe { env::set_var("POLL_INTERVAL", "soon") };
        let result = Config::new().load();
        clear_env();

        assert!(matches!(
            result,
            Err(AppError::InvalidConfig { key, value, .. }) if key == "POLL_INTERVAL" && value == "soon"
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_unknown_permission_reports_reason() {
        clear_env();
        unsafe { env::set_var("NOTIFICATION_PERMISSION", "sometimes") };
        let result = Config::new().load();
        clear_env();

        assert!(matches!(
            result,
            Err(AppError::InvalidConfig { key, reason, .. })
                if key == "NOTIFICATION_PERMISSION" && reason.contains("`sometimes`")
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_zero_rate_limit_is_rejected() {
        clear_env();
        unsafe { env::set_var("ARRIVALS_RATE_LIMIT", "0") };
        let result = Config::new().load();
        clear_env();

        assert!(result.is_err());
    }
}
