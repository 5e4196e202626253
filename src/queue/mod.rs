//! Неограниченная FIFO-очередь с ожидающим чтением.
//!
//! Каждая очередь обслуживается одной координирующей задачей tokio,
//! которая единолично владеет растущим буфером. Производители и
//! потребители общаются с ней через каналы ёмкостью 1:
//!
//! - `push` никогда не ждёт заполнения буфера, только передачу значения
//!   задаче;
//! - `poll` ждёт, пока значение появится или очередь будет закрыта и
//!   выдана до конца.
//!
//! `push` после `close` отклоняется с [`PushError`], значение
//! возвращается вызывающему.

mod poller;
mod worker;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, trace};

pub use poller::Poller;

use crate::error::{PollError, PushError, TryPollError};

/// Ёмкость каналов передачи между вызывающими и координирующей задачей.
const HANDOFF_CAPACITY: usize = 1;

/// Неограниченная очередь.
///
/// Хэндл дешёво клонируется, все клоны указывают на одну очередь.
/// Когда последний клон уходит из области видимости, очередь ведёт себя
/// как после `close(None)`: оставшиеся значения ещё можно прочитать
/// через [`Poller`].
pub struct Queue<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    /// Вход очереди, `None` после `close`.
    intake: Mutex<Option<mpsc::Sender<T>>>,
    /// Одноразовый сигнал принудительного закрытия.
    force: Mutex<Option<oneshot::Sender<()>>>,
    /// Once-guard для `close`.
    closed: AtomicBool,
    reader: Poller<T>,
    worker: JoinHandle<worker::StopReason>,
    runtime: Handle,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<T> Queue<T>
where
    T: Send + 'static,
{
    /// Создаёт очередь и запускает её координирующую задачу.
    ///
    /// # Panics
    /// Паникует, если вызвана вне контекста tokio runtime.
    pub fn new() -> Self {
        let runtime = Handle::current();
        let (intake_tx, intake_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (outtake_tx, outtake_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (force_tx, force_rx) = oneshot::channel();
        let forced = Arc::new(AtomicBool::new(false));

        let worker = runtime.spawn(worker::run(
            intake_rx,
            outtake_tx,
            force_rx,
            Arc::clone(&forced),
        ));

        Self {
            shared: Arc::new(Shared {
                intake: Mutex::new(Some(intake_tx)),
                force: Mutex::new(Some(force_tx)),
                closed: AtomicBool::new(false),
                reader: Poller::new(outtake_rx, forced),
                worker,
                runtime,
            }),
        }
    }
}

impl<T> Queue<T> {
    /// Добавляет значение в конец очереди.
    ///
    /// Ждёт только передачи значения координирующей задаче, которая
    /// принимает вход в любом состоянии буфера.
    ///
    /// # Ошибки
    /// `PushError` с исходным значением, если очередь уже закрыта.
    pub async fn push(
        &self,
        value: T,
    ) -> Result<(), PushError<T>> {
        let Some(intake) = self.intake() else {
            trace!("push rejected: queue is closed");
            return Err(PushError(value));
        };
        intake.send(value).await.map_err(|err| PushError(err.0))
    }

    /// Блокирующий вариант [`Queue::push`] для потоков вне tokio runtime.
    ///
    /// # Panics
    /// Паникует при вызове из асинхронного контекста.
    pub fn blocking_push(
        &self,
        value: T,
    ) -> Result<(), PushError<T>> {
        let Some(intake) = self.intake() else {
            return Err(PushError(value));
        };
        intake.blocking_send(value).map_err(|err| PushError(err.0))
    }

    /// Ожидает следующее значение, см. [`Poller::poll`].
    pub async fn poll(&self) -> Option<T> {
        self.shared.reader.poll().await
    }

    /// Блокирующий вариант [`Queue::poll`].
    pub fn blocking_poll(&self) -> Option<T> {
        self.shared.reader.blocking_poll()
    }

    /// Неблокирующий вариант [`Queue::poll`].
    pub fn try_poll(&self) -> Result<T, TryPollError> {
        self.shared.reader.try_poll()
    }

    /// Ожидает значение не дольше `timeout`.
    pub async fn poll_timeout(
        &self,
        timeout: Duration,
    ) -> Result<T, PollError> {
        self.shared.reader.poll_timeout(timeout).await
    }

    /// Возвращает новый читающий хэндл этой очереди.
    pub fn poller(&self) -> Poller<T> {
        self.shared.reader.clone()
    }

    /// Закрывает очередь для записи.
    ///
    /// - `None`: очередь становится read-only, накопленные значения
    ///   остаются доступны, после их выдачи `poll` возвращает `None`.
    /// - `Some(timeout)`: то же самое, но через `timeout` очередь
    ///   закрывается принудительно: все ждущие `poll` получают `None`,
    ///   невыданные значения отбрасываются.
    ///
    /// Повторные вызовы ничего не делают.
    pub fn close(
        &self,
        timeout: Option<Duration>,
    ) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.intake.lock().take();
        debug!(?timeout, "queue closed for push");

        let Some(timeout) = timeout else {
            return;
        };
        let Some(mut force) = self.shared.force.lock().take() else {
            return;
        };

        if timeout.is_zero() {
            let _ = force.send(());
            return;
        }

        self.shared.runtime.spawn(async move {
            let fire = tokio::select! {
                _ = tokio::time::sleep(timeout) => true,
                // Воркер уже завершился, сигналить некому.
                _ = force.closed() => false,
            };
            if fire {
                let _ = force.send(());
            }
        });
    }

    /// Возвращает `true`, если `close` уже вызывался.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Возвращает `true`, если координирующая задача завершилась.
    pub fn is_finished(&self) -> bool {
        self.shared.worker.is_finished()
    }

    fn intake(&self) -> Option<mpsc::Sender<T>> {
        self.shared.intake.lock().clone()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Queue<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Queue")
            .field("closed", &self.is_closed())
            .field("finished", &self.is_finished())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
