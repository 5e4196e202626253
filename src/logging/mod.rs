pub mod config;
mod filters;
mod formatter;

pub use self::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Инициализация логирования с конфигурацией.
///
/// Повторный вызов (или уже установленный глобальный subscriber)
/// возвращает ошибку и ничего не меняет.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = filters::build_filter_from_config(config);
    let fmt_layer = formatter::build_formatter_from_config(config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что повторная инициализация не паникует, а
    /// возвращает ошибку.
    #[test]
    fn test_init_logging_twice() {
        let cfg = LoggingConfig {
            with_ansi: false,
            ..Default::default()
        };
        let _ = init_logging(&cfg);
        assert!(init_logging(&cfg).is_err());
    }
}
