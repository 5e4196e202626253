use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// Причина остановки координирующей задачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    /// Приём закрыт и буфер полностью выдан.
    Drained,
    /// Сработал принудительный close по таймауту.
    Forced,
    /// Не осталось ни одного читателя.
    ReadersGone,
}

/// Координирующая задача очереди.
///
/// Единственный владелец буфера. Работает в двух режимах:
/// - буфер пуст: ждёт новое значение или сигнал закрытия;
/// - буфер не пуст: одновременно предлагает голову буфера читателю и
///   принимает новые значения, отдавая приоритет выдаче.
///
/// При выходе `outtake` дропается, и все ожидающие `poll` получают `None`.
/// При принудительной остановке до этого выставляется `forced`: значение,
/// уже лежащее в канале выдачи, читатели тоже отбрасывают.
pub(crate) async fn run<T>(
    mut intake: mpsc::Receiver<T>,
    outtake: mpsc::Sender<T>,
    mut force: oneshot::Receiver<()>,
    forced: Arc<AtomicBool>,
) -> StopReason {
    let mut buffer: VecDeque<T> = VecDeque::new();
    let mut intake_open = true;
    // Sender силы дропается без сигнала, если close был без таймаута
    // или очередь ушла из области видимости.
    let mut force_armed = true;

    let reason = loop {
        if buffer.is_empty() {
            if !intake_open {
                break StopReason::Drained;
            }

            tokio::select! {
                biased;

                signal = &mut force, if force_armed => match signal {
                    Ok(()) => break StopReason::Forced,
                    Err(_) => force_armed = false,
                },

                _ = outtake.closed() => break StopReason::ReadersGone,

                value = intake.recv() => match value {
                    Some(value) => buffer.push_back(value),
                    None => break StopReason::Drained,
                },
            }
        } else {
            tokio::select! {
                biased;

                signal = &mut force, if force_armed => match signal {
                    Ok(()) => break StopReason::Forced,
                    Err(_) => force_armed = false,
                },

                permit = outtake.reserve() => match permit {
                    Ok(permit) => {
                        if let Some(value) = buffer.pop_front() {
                            permit.send(value);
                            trace!(pending = buffer.len(), "queue handed value to poller");
                        }
                    }
                    Err(_) => break StopReason::ReadersGone,
                },

                value = intake.recv(), if intake_open => match value {
                    Some(value) => buffer.push_back(value),
                    None => intake_open = false,
                },
            }
        }
    };

    if reason == StopReason::Forced {
        forced.store(true, Ordering::Release);
    }

    debug!(?reason, discarded = buffer.len(), "queue worker stopped");
    reason
}
