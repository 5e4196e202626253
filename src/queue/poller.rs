use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::{mpsc, Mutex};

use crate::error::{PollError, TryPollError};

/// Читающий хэндл очереди.
///
/// Подписчик получает только `Poller`: буфером и закрытием очереди
/// владеет брокер. Хэндл можно клонировать и делить между несколькими
/// потребителями, каждое значение достаётся ровно одному из них, в
/// порядке FIFO.
///
/// `None` из `poll` означает, что очередь закрыта и выдана до конца.
/// Это состояние окончательное: все последующие вызовы тоже вернут `None`.
pub struct Poller<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
    /// Выставляется координирующей задачей при принудительном закрытии.
    forced: Arc<AtomicBool>,
}

impl<T> Poller<T> {
    pub(crate) fn new(
        rx: mpsc::Receiver<T>,
        forced: Arc<AtomicBool>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
            forced,
        }
    }

    /// Асинхронно ожидает следующее значение.
    ///
    /// # Возвращает
    /// - `Some(value)` как только значение доступно
    /// - `None` если очередь закрыта и буфер пуст (или сработал
    ///   принудительный close)
    pub async fn poll(&self) -> Option<T> {
        let value = self.rx.lock().await.recv().await;
        self.unless_forced(value)
    }

    /// Блокирующий вариант [`Poller::poll`] для потоков вне tokio runtime.
    ///
    /// # Panics
    /// Паникует при вызове из асинхронного контекста.
    pub fn blocking_poll(&self) -> Option<T> {
        let value = self.rx.blocking_lock().blocking_recv();
        self.unless_forced(value)
    }

    /// Пытается получить значение без ожидания.
    ///
    /// Если другой потребитель сейчас ждёт в `poll`, возвращает
    /// `TryPollError::Empty`.
    pub fn try_poll(&self) -> Result<T, TryPollError> {
        let Ok(mut rx) = self.rx.try_lock() else {
            return Err(TryPollError::Empty);
        };
        let value = rx.try_recv().map_err(|err| match err {
            mpsc::error::TryRecvError::Empty => TryPollError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryPollError::Closed,
        })?;
        self.unless_forced(Some(value)).ok_or(TryPollError::Closed)
    }

    /// Ожидает значение не дольше `timeout`.
    ///
    /// # Возвращает
    /// - `Ok(value)` при успешном получении
    /// - `Err(PollError::Closed)` если очередь закрыта и пуста
    /// - `Err(PollError::Timeout)` если значение не пришло вовремя
    pub async fn poll_timeout(
        &self,
        timeout: Duration,
    ) -> Result<T, PollError> {
        match tokio::time::timeout(timeout, self.poll()).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(PollError::Closed),
            Err(_) => Err(PollError::Timeout),
        }
    }

    /// После принудительного закрытия значение из канала выдачи
    /// отбрасывается.
    fn unless_forced(
        &self,
        value: Option<T>,
    ) -> Option<T> {
        if self.forced.load(Ordering::Acquire) {
            None
        } else {
            value
        }
    }
}

impl<T> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
            forced: Arc::clone(&self.forced),
        }
    }
}

impl<T> fmt::Debug for Poller<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Poller")
            .field("handles", &Arc::strong_count(&self.rx))
            .field("forced", &self.forced.load(Ordering::Relaxed))
            .finish()
    }
}
