//! Application Settings
//!
//! 프로세스 환경변수에서 1회 읽어 들이는 설정. 시작 이후에는 읽기 전용입니다.

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::db::ConnectionConfig;
use crate::services::composer::ComposerDefaults;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

/// 전역 설정 (최초 접근 시 환경변수에서 로드)
///
/// `.env` 로딩 이후에 처음 호출되어야 합니다.
pub fn settings() -> &'static Settings {
    &SETTINGS
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub db_pool_size: u32,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout: Duration,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            db_path: PathBuf::from("asl_agent.db"),
            db_pool_size: 8,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_timeout: Duration::from_secs(30),
            log_level: "info".to_string(),
        }
    }
}

/// 비어 있지 않은 환경변수만 값으로 취급
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(env_non_empty)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("ASL_AGENT_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let db_pool_size = lookup("DB_POOL_SIZE")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.db_pool_size);

        let openai_timeout = lookup("OPENAI_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.openai_timeout);

        Self {
            host: lookup("ASL_AGENT_HOST").unwrap_or(defaults.host),
            port,
            db_path: lookup("ASL_AGENT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            db_pool_size,
            openai_api_key: lookup("OPENAI_API_KEY"),
            openai_model: lookup("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_timeout,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn composer_defaults(&self) -> ComposerDefaults {
        ComposerDefaults {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
            timeout: self.openai_timeout,
        }
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            pool_size: self.db_pool_size,
            ..ConnectionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let settings = Settings::from_lookup(lookup_from(&[]));
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.openai_model, DEFAULT_OPENAI_MODEL);
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.db_pool_size, 8);
    }

    #[test]
    fn test_reads_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_TIMEOUT_SECS", "5"),
            ("DB_POOL_SIZE", "0"),
        ]));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(settings.openai_model, "gpt-4o");
        assert_eq!(settings.openai_timeout, Duration::from_secs(5));
        // 0 은 무시하고 기본값 유지
        assert_eq!(settings.db_pool_size, 8);
    }

    #[test]
    fn test_service_port_wins_over_generic_port() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("ASL_AGENT_PORT", "7000"),
            ("PORT", "9000"),
        ]));
        assert_eq!(settings.port, 7000);
    }
}
