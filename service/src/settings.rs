use std::time::Duration;

use capability_client::CapabilityClientConfig;
use database::database_path::default_database_url;

use crate::{bootcamp_deletion::service::DEFAULT_MAX_CONCURRENT_CAPABILITIES, error::Error};

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const CAPABILITY_SERVICE_URL: &str = "CAPABILITY_SERVICE_URL";
pub const CAPABILITY_SERVICE_TOKEN: &str = "CAPABILITY_SERVICE_TOKEN";
pub const CAPABILITY_SERVICE_TIMEOUT_MS: &str = "CAPABILITY_SERVICE_TIMEOUT_MS";
pub const MAX_CONCURRENT_CAPABILITIES: &str = "MAX_CONCURRENT_CAPABILITIES";

const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub capability_service_url: String,
    pub capability_service_token: String,
    pub capability_service_timeout: Duration,
    pub max_concurrent_capabilities: usize,
}

// token stays out of the logs
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("capability_service_url", &self.capability_service_url)
            .field("capability_service_timeout", &self.capability_service_timeout)
            .field(
                "max_concurrent_capabilities",
                &self.max_concurrent_capabilities,
            )
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Reads settings from the process environment, loading a `.env` file first if present.
    /// A value returned by `overrides` wins over the environment for the same key.
    pub fn from_env<O>(overrides: O) -> Result<Self, Error>
    where
        O: Fn(&str) -> Option<String>,
    {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = match get(DATABASE_URL) {
            Some(url) => url,
            None => default_database_url()?,
        };
        let capability_service_url = get(CAPABILITY_SERVICE_URL)
            .ok_or_else(|| Error::SettingsError(format!("{} is not set", CAPABILITY_SERVICE_URL)))?;
        let capability_service_token = get(CAPABILITY_SERVICE_TOKEN).ok_or_else(|| {
            Error::SettingsError(format!("{} is not set", CAPABILITY_SERVICE_TOKEN))
        })?;
        let timeout_ms = parse_positive(
            CAPABILITY_SERVICE_TIMEOUT_MS,
            get(CAPABILITY_SERVICE_TIMEOUT_MS),
            DEFAULT_TIMEOUT_MS,
        )?;
        let max_concurrent_capabilities = parse_positive(
            MAX_CONCURRENT_CAPABILITIES,
            get(MAX_CONCURRENT_CAPABILITIES),
            DEFAULT_MAX_CONCURRENT_CAPABILITIES as u64,
        )? as usize;

        Ok(Self {
            database_url,
            capability_service_url,
            capability_service_token,
            capability_service_timeout: Duration::from_millis(timeout_ms),
            max_concurrent_capabilities,
        })
    }

    pub fn capability_client_config(&self) -> CapabilityClientConfig {
        CapabilityClientConfig {
            base_url: self.capability_service_url.clone(),
            token: self.capability_service_token.clone(),
            timeout: self.capability_service_timeout,
        }
    }
}

fn parse_positive(key: &str, value: Option<String>, default: u64) -> Result<u64, Error> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(0) => Err(Error::SettingsError(format!("{} must be greater than 0", key))),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(Error::SettingsError(format!(
            "Invalid value '{}' for {}: {}",
            value, key, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        (DATABASE_URL, "sqlite::memory:"),
        (CAPABILITY_SERVICE_URL, "http://capability:8080"),
        (CAPABILITY_SERVICE_TOKEN, "secret"),
    ];

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.capability_service_timeout, Duration::from_millis(5000));
        assert_eq!(settings.max_concurrent_capabilities, 4);
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push((CAPABILITY_SERVICE_TIMEOUT_MS, "250"));
        pairs.push((MAX_CONCURRENT_CAPABILITIES, " 8 "));

        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        let config = settings.capability_client_config();

        assert_eq!(settings.max_concurrent_capabilities, 8);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.base_url, "http://capability:8080");
        assert_eq!(config.token, "secret");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let result = Settings::from_lookup(lookup(&REQUIRED[..2]));
        assert!(matches!(result, Err(Error::SettingsError(message)) if message.contains(CAPABILITY_SERVICE_TOKEN)));
    }

    #[test]
    fn test_zero_and_garbage_are_rejected() {
        for (key, value) in [
            (MAX_CONCURRENT_CAPABILITIES, "0"),
            (MAX_CONCURRENT_CAPABILITIES, "many"),
            (CAPABILITY_SERVICE_TIMEOUT_MS, "-1"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            assert!(
                matches!(
                    Settings::from_lookup(lookup(&pairs)),
                    Err(Error::SettingsError(_))
                ),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_from_env_prefers_overrides_and_reads_dotenv_file() {
        let path = std::env::temp_dir().join(format!("bootcamp-settings-{}.env", std::process::id()));
        std::fs::write(
            &path,
            "DATABASE_URL=sqlite::memory:\nCAPABILITY_SERVICE_URL=http://from-file:8080\nCAPABILITY_SERVICE_TOKEN=file-token\n",
        )
        .unwrap();
        dotenvy::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let settings = Settings::from_env(|key| {
            (key == CAPABILITY_SERVICE_TOKEN).then(|| "flag-token".to_string())
        })
        .unwrap();

        assert_eq!(settings.capability_service_url, "http://from-file:8080");
        assert_eq!(settings.capability_service_token, "flag-token");
    }

    #[test]
    fn test_debug_hides_token() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
        assert!(!format!("{:?}", settings).contains("secret"));
    }
}
