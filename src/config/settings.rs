use std::path::Path;

use ::config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use super::BrokerConfig;
use crate::logging::LoggingConfig;

/// Префикс переменных окружения: `ZUMIC_MQ_BROKER__MATCH_CACHE=false`.
pub const ENV_PREFIX: &str = "ZUMIC_MQ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки из значений по умолчанию и переменных
    /// окружения.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// То же, что [`Settings::load`], но сначала читает файл (toml,
    /// json, yaml... по расширению). Переменные окружения важнее файла.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("broker.match_cache", true)?
            .set_default("logging.level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let cfg = builder
            // Переменные окружения с префиксом ZUMIC_MQ_
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::{env, io::Write};

    use serial_test::serial;

    use super::*;
    use crate::{config::AfterClose, logging::LogFormat};

    const VARS: [&str; 4] = [
        "ZUMIC_MQ_BROKER__MATCH_CACHE",
        "ZUMIC_MQ_BROKER__MAX_CACHED_TOPICS",
        "ZUMIC_MQ_BROKER__AFTER_CLOSE",
        "ZUMIC_MQ_LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        let settings = Settings::load().unwrap();
        assert_eq!(settings, Settings::default());
    }

    /// Тест проверяет, что переменные окружения попадают во вложенные
    /// секции.
    #[test]
    #[serial]
    fn test_load_env_overrides() {
        clear_env();
        env::set_var("ZUMIC_MQ_BROKER__MATCH_CACHE", "false");
        env::set_var("ZUMIC_MQ_BROKER__MAX_CACHED_TOPICS", "128");
        env::set_var("ZUMIC_MQ_BROKER__AFTER_CLOSE", "accept");
        env::set_var("ZUMIC_MQ_LOGGING__FORMAT", "json");

        let settings = Settings::load();
        clear_env();
        let settings = settings.unwrap();

        assert!(!settings.broker.match_cache);
        assert_eq!(settings.broker.max_cached_topics, 128);
        assert_eq!(settings.broker.after_close, AfterClose::Accept);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    /// Тест проверяет чтение из файла и приоритет окружения над ним.
    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let dir = env::temp_dir().join(format!("zumic-mq-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mq.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[broker]\nclose_timeout_ms = 500\nmax_cached_topics = 16\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        env::set_var("ZUMIC_MQ_BROKER__MAX_CACHED_TOPICS", "32");
        let settings = Settings::load_from(&path);
        clear_env();
        std::fs::remove_dir_all(&dir).unwrap();
        let settings = settings.unwrap();

        assert_eq!(settings.broker.close_timeout_ms, 500);
        assert_eq!(settings.broker.max_cached_topics, 32);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_load_from_missing_file_fails() {
        clear_env();
        assert!(Settings::load_from("/definitely/not/here/mq.toml").is_err());
    }
}
