use thiserror::Error;

/// Ошибки брокера и построения матчеров.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Брокер закрыт и настроен отклонять новые подписки.
    #[error("broker is closed")]
    Closed,

    /// Шаблон матчера не компилируется.
    #[error("invalid topic pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl BrokerError {
    pub(crate) fn invalid_pattern(
        pattern: &str,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<globset::Error> for BrokerError {
    fn from(err: globset::Error) -> Self {
        let pattern = err.glob().unwrap_or_default().to_string();
        Self::InvalidPattern {
            pattern,
            reason: err.kind().to_string(),
        }
    }
}
