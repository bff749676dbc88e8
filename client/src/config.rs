use anyhow::anyhow;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORAGE_PATH: &str = ".staffdesk/store.json";

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    api_base_url: String,
    request_timeout_secs: u64,
    storage_path: String,
    time_zone: String,
}

/// Runtime settings for the client. Values come from `STAFFDESK_*`
/// environment variables (a `.env` file is honoured) with defaults for local
/// development.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub storage_path: PathBuf,
    pub time_zone: Tz,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let raw: RawConfig = config::Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("storage_path", DEFAULT_STORAGE_PATH)?
            .set_default("time_zone", "UTC")?
            .add_source(config::Environment::with_prefix("STAFFDESK").try_parsing(true))
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    /// Configuration pointing at `api_base_url` with every other value at its
    /// default.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_base_url(&api_base_url.into()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            time_zone: Tz::UTC,
        }
    }

    fn from_raw(raw: RawConfig) -> anyhow::Result<Self> {
        let base = normalize_base_url(&raw.api_base_url);
        if base.is_empty() {
            return Err(anyhow!("STAFFDESK_API_BASE_URL must not be empty"));
        }
        if raw.request_timeout_secs == 0 {
            return Err(anyhow!("STAFFDESK_REQUEST_TIMEOUT_SECS must be positive"));
        }
        let time_zone: Tz = raw
            .time_zone
            .parse()
            .map_err(|_| anyhow!("Invalid STAFFDESK_TIME_ZONE value: {}", raw.time_zone))?;

        Ok(Self {
            api_base_url: base,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            storage_path: PathBuf::from(raw.storage_path),
            time_zone,
        })
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(time_zone: &str) -> RawConfig {
        RawConfig {
            api_base_url: "https://hr.example.com/api/".into(),
            request_timeout_secs: 15,
            storage_path: "/tmp/store.json".into(),
            time_zone: time_zone.into(),
        }
    }

    #[test]
    fn from_raw_parses_time_zone_and_trims_base_url() {
        let cfg = AppConfig::from_raw(raw("America/Bogota")).unwrap();
        assert_eq!(cfg.api_base_url, "https://hr.example.com/api");
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert_eq!(cfg.time_zone, chrono_tz::America::Bogota);
    }

    #[test]
    fn from_raw_rejects_unknown_time_zone() {
        let err = AppConfig::from_raw(raw("Mars/Olympus")).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn from_raw_rejects_zero_timeout() {
        let mut cfg = raw("UTC");
        cfg.request_timeout_secs = 0;
        assert!(AppConfig::from_raw(cfg).is_err());
    }

    #[test]
    fn with_base_url_uses_defaults() {
        let cfg = AppConfig::with_base_url("http://mock/api/");
        assert_eq!(cfg.api_base_url, "http://mock/api");
        assert_eq!(cfg.time_zone, Tz::UTC);
    }
}
