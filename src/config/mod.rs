use dashmap::DashMap;
use std::env;
use std::sync::Arc;

pub const ENV_LOG_UNHANDLED: &str = "XYAPI_LOG_UNHANDLED";
pub const ENV_LOG_CLIENT_ERRORS: &str = "XYAPI_LOG_CLIENT_ERRORS";
pub const ENV_CATCH_PANICS: &str = "XYAPI_CATCH_PANICS";

/// Key/value configuration source
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot of the process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars_os() {
            match (key.to_str(), value.to_str()) {
                (Some(key), Some(value)) => service.set(key, value),
                _ => tracing::debug!("Skipping non UTF-8 environment variable {:?}", key),
            }
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// `true`/`1`/`yes`/`on` and their opposites, case-insensitive
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => {
                tracing::warn!("Ignoring invalid boolean for {}: {:?}", key, value);
                None
            }
        }
    }
}

/// Settings for the exception handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiConfig {
    /// Log unhandled errors and panics at `error`
    pub log_unhandled: bool,
    /// Log validation and HTTP errors at `info` instead of `debug`
    pub log_client_errors: bool,
    /// Turn handler panics into unhandled-error envelopes
    pub catch_panics: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            log_unhandled: true,
            log_client_errors: false,
            catch_panics: true,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_service(&ConfigService::new())
    }

    /// Missing or invalid keys keep their defaults
    pub fn from_service(service: &ConfigService) -> Self {
        let defaults = Self::default();
        Self {
            log_unhandled: service
                .get_bool(ENV_LOG_UNHANDLED)
                .unwrap_or(defaults.log_unhandled),
            log_client_errors: service
                .get_bool(ENV_LOG_CLIENT_ERRORS)
                .unwrap_or(defaults.log_client_errors),
            catch_panics: service
                .get_bool(ENV_CATCH_PANICS)
                .unwrap_or(defaults.catch_panics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let service = ConfigService::default();
        assert_eq!(ApiConfig::from_service(&service), ApiConfig::default());
    }

    #[test]
    fn test_from_service() {
        let service = ConfigService::default();
        service.set(ENV_LOG_UNHANDLED, "off");
        service.set(ENV_LOG_CLIENT_ERRORS, "TRUE");
        service.set(ENV_CATCH_PANICS, "maybe");

        let config = ApiConfig::from_service(&service);
        assert!(!config.log_unhandled);
        assert!(config.log_client_errors);
        assert!(config.catch_panics);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_environment_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        const KEY: &str = "XYAPI_TEST_NON_UTF8";
        // Only this test touches the variable.
        unsafe { env::set_var(KEY, OsStr::from_bytes(&[0xff, 0xfe])) };

        let service = ConfigService::new();
        let config = ApiConfig::from_env();

        unsafe { env::remove_var(KEY) };
        assert_eq!(service.get(KEY), None);
        assert_eq!(config, ApiConfig::default());
    }
}
