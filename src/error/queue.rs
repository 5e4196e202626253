use std::fmt;

use thiserror::Error;

/// Ошибка `push` в закрытую очередь.
///
/// Значение не теряется: оно возвращается вызывающему в поле `0`.
pub struct PushError<T>(pub T);

/// Ошибка ожидания значения с таймаутом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("queue is closed and drained")]
    Closed,

    #[error("operation exceeded the specified timeout")]
    Timeout,
}

/// Ошибка неблокирующего получения значения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryPollError {
    #[error("no values available")]
    Empty,

    #[error("queue is closed and drained")]
    Closed,
}

impl<T> PushError<T> {
    /// Возвращает отклонённое значение.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("PushError").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "queue is closed for push")
    }
}

impl<T> std::error::Error for PushError<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_error_display_and_value() {
        let err = PushError(42);
        assert_eq!(err.to_string(), "queue is closed for push");
        assert_eq!(format!("{err:?}"), "PushError { .. }");
        assert_eq!(err.into_inner(), 42);
    }

    #[test]
    fn test_poll_error_display() {
        assert_eq!(PollError::Closed.to_string(), "queue is closed and drained");
        assert_eq!(
            PollError::Timeout.to_string(),
            "operation exceeded the specified timeout"
        );
    }

    #[test]
    fn test_try_poll_error_display() {
        assert_eq!(TryPollError::Empty.to_string(), "no values available");
        assert_eq!(TryPollError::Closed.to_string(), "queue is closed and drained");
    }
}
