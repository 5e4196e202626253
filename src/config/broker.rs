use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Поведение `subscribe` после `Broker::close`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AfterClose {
    /// `subscribe` возвращает `BrokerError::Closed`.
    #[default]
    Reject,
    /// Подписка регистрируется, брокер работает как новый.
    Accept,
}

/// Конфигурация брокера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Кэшировать результаты матчинга по топику.
    pub match_cache: bool,
    /// Максимум топиков в кэше, `0` - без ограничения. При достижении
    /// лимита кэш очищается целиком.
    pub max_cached_topics: usize,
    /// Что делать с подписками после закрытия брокера.
    pub after_close: AfterClose,
    /// Таймаут для `Broker::shutdown` в миллисекундах. Отрицательное
    /// значение: очереди только переводятся в read-only.
    pub close_timeout_ms: i64,
}

impl BrokerConfig {
    /// Таймаут принудительного закрытия, `None` для отрицательного
    /// `close_timeout_ms`.
    pub fn close_timeout(&self) -> Option<Duration> {
        u64::try_from(self.close_timeout_ms)
            .ok()
            .map(Duration::from_millis)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            match_cache: true,
            max_cached_topics: 0,
            after_close: AfterClose::Reject,
            close_timeout_ms: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_timeout_sign() {
        let mut cfg = BrokerConfig::default();
        assert_eq!(cfg.close_timeout(), None);

        cfg.close_timeout_ms = 0;
        assert_eq!(cfg.close_timeout(), Some(Duration::ZERO));

        cfg.close_timeout_ms = 250;
        assert_eq!(cfg.close_timeout(), Some(Duration::from_millis(250)));
    }

    /// Тест проверяет, что частичная конфигурация дополняется
    /// значениями по умолчанию, а `after_close` читается в нижнем регистре.
    #[test]
    fn test_partial_config_deserialize() {
        let parsed: BrokerConfig = ::config::Config::builder()
            .set_default("after_close", "accept")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed.after_close, AfterClose::Accept);
        assert!(parsed.match_cache);
        assert_eq!(parsed.close_timeout_ms, -1);
    }
}
