//! Брокер топиков.
//!
//! Хранит реестр пар (матчер, очередь), раздаёт опубликованные значения
//! всем очередям, чей матчер принимает топик, и кэширует результаты
//! матчинга по топику. Реестр и кэш защищены одним `RwLock`:
//! `publish` с попаданием в кэш идёт под read-блокировкой, любые
//! изменения реестра и заполнение кэша - под write-блокировкой.

mod cache;
mod stats;

use std::{fmt, time::Duration};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use self::cache::MatchCache;
pub(crate) use self::stats::BrokerStats;
pub use self::stats::BrokerStatsSnapshot;
use crate::{
    config::{AfterClose, BrokerConfig},
    error::BrokerError,
    matcher::Matcher,
    queue::{Poller, Queue},
};

/// Брокер Pub/Sub внутри процесса.
///
/// Брокер владеет всеми очередями, которые создаёт `subscribe`;
/// подписчику достаётся только [`Poller`]. Для совместного
/// использования оборачивается в `Arc`.
pub struct Broker<T> {
    state: RwLock<Registry<T>>,
    config: BrokerConfig,
    stats: BrokerStats,
}

struct Registry<T> {
    /// Подписки в порядке регистрации
    entries: Vec<Entry<T>>,
    cache: MatchCache,
    closed: bool,
}

struct Entry<T> {
    matcher: Box<dyn Matcher>,
    queue: Queue<T>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<T> Broker<T> {
    /// Создаёт брокер с конфигурацией по умолчанию.
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    pub fn with_config(config: BrokerConfig) -> Self {
        Self {
            state: RwLock::new(Registry {
                entries: Vec::new(),
                cache: MatchCache::new(config.max_cached_topics),
                closed: false,
            }),
            config,
            stats: BrokerStats::default(),
        }
    }

    /// Удаляет первую подписку с матчером, равным `matcher`, и
    /// закрывает её очередь с тем же `timeout`, что и
    /// [`Queue::close`].
    ///
    /// Кэш матчинга очищается целиком.
    ///
    /// # Возвращает
    /// `true`, если подписка найдена и удалена.
    pub fn close_topic(
        &self,
        matcher: &dyn Matcher,
        timeout: Option<Duration>,
    ) -> bool {
        let mut state = self.state.write();
        let Some(index) = state
            .entries
            .iter()
            .position(|entry| entry.matcher.same_as(matcher))
        else {
            trace!(?matcher, "close_topic: no such subscription");
            return false;
        };

        let entry = state.entries.remove(index);
        entry.queue.close(timeout);
        state.cache.invalidate();

        debug!(
            ?matcher,
            ?timeout,
            subscribers = state.entries.len(),
            "topic closed"
        );
        true
    }

    /// Закрывает все очереди с заданным `timeout` и очищает реестр.
    ///
    /// Дальнейшие `subscribe` ведут себя согласно
    /// [`BrokerConfig::after_close`].
    pub fn close(
        &self,
        timeout: Option<Duration>,
    ) {
        let mut state = self.state.write();
        let closed = state.entries.len();
        for entry in state.entries.drain(..) {
            entry.queue.close(timeout);
        }
        state.cache.invalidate();
        state.closed = true;

        debug!(?timeout, closed, "broker closed");
    }

    /// `close` с таймаутом из [`BrokerConfig::close_timeout`].
    pub fn shutdown(&self) {
        self.close(self.config.close_timeout());
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    /// Текущее количество подписок.
    pub fn subscriber_count(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Количество топиков в кэше матчинга.
    pub fn cached_topics(&self) -> usize {
        self.state.read().cache.len()
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Снимок счётчиков брокера.
    pub fn stats(&self) -> BrokerStatsSnapshot {
        let state = self.state.read();
        self.stats.snapshot(
            state.cache.invalidations(),
            state.entries.len(),
            state.cache.len(),
        )
    }

    /// Очереди, чей матчер принимает `topic`, в порядке реестра.
    fn resolve(
        &self,
        topic: &str,
    ) -> Vec<Queue<T>> {
        self.stats.record_publish();

        if !self.config.match_cache {
            let state = self.state.read();
            let mask = cache::evaluate(topic, state.matchers());
            return state.select(&mask);
        }

        {
            let state = self.state.read();
            if let Some(mask) = state.cache.get(topic) {
                self.stats.record_cache_hit();
                return state.select(&mask);
            }
        }

        self.stats.record_cache_miss();
        let mut state = self.state.write();
        // Между read и write реестр мог измениться или кэш уже
        // заполнил другой publish: get_or_populate перепроверяет.
        let Registry { entries, cache, .. } = &mut *state;
        let mask = cache.get_or_populate(topic, entries.iter().map(|e| e.matcher.as_ref()));
        state.select(&mask)
    }

    fn record_fanout(
        &self,
        topic: &str,
        delivered: usize,
        dropped: usize,
    ) {
        self.stats.record_delivered(delivered as u64);
        if dropped > 0 {
            self.stats.record_dropped(dropped as u64);
            debug!(topic, dropped, "publish hit closed queues");
        }
        trace!(topic, delivered, "published");
    }
}

impl<T> Broker<T>
where
    T: Clone + Send + 'static,
{
    /// Публикует значение в топик.
    ///
    /// Значение кладётся во все очереди, чей матчер принимает `topic`,
    /// в порядке регистрации подписок. Блокировки отпускаются до
    /// передачи значений очередям.
    ///
    /// # Возвращает
    /// Количество очередей, принявших значение.
    pub async fn publish(
        &self,
        topic: &str,
        value: T,
    ) -> usize {
        let mut targets = self.resolve(topic);
        let (mut delivered, mut dropped) = (0, 0);

        // Последней очереди значение отдаётся без клонирования.
        if let Some(last) = targets.pop() {
            for queue in targets {
                match queue.push(value.clone()).await {
                    Ok(()) => delivered += 1,
                    Err(_) => dropped += 1,
                }
            }
            match last.push(value).await {
                Ok(()) => delivered += 1,
                Err(_) => dropped += 1,
            }
        }

        self.record_fanout(topic, delivered, dropped);
        delivered
    }

    /// Блокирующий вариант [`Broker::publish`] для потоков вне tokio
    /// runtime.
    ///
    /// # Panics
    /// Паникует при вызове из асинхронного контекста.
    pub fn blocking_publish(
        &self,
        topic: &str,
        value: T,
    ) -> usize {
        let mut targets = self.resolve(topic);
        let (mut delivered, mut dropped) = (0, 0);

        if let Some(last) = targets.pop() {
            for queue in targets {
                match queue.blocking_push(value.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => dropped += 1,
                }
            }
            match last.blocking_push(value) {
                Ok(()) => delivered += 1,
                Err(_) => dropped += 1,
            }
        }

        self.record_fanout(topic, delivered, dropped);
        delivered
    }

    /// Регистрирует матчер и возвращает читающий хэндл новой очереди.
    ///
    /// Кэш матчинга очищается целиком.
    ///
    /// # Ошибки
    /// `BrokerError::Closed`, если брокер закрыт и
    /// `after_close = Reject`.
    ///
    /// # Panics
    /// Паникует вне контекста tokio runtime (см. [`Queue::new`]).
    pub fn subscribe<M>(
        &self,
        matcher: M,
    ) -> Result<Poller<T>, BrokerError>
    where
        M: Matcher,
    {
        self.subscribe_boxed(Box::new(matcher))
    }

    /// То же, что [`Broker::subscribe`], для уже упакованного матчера.
    pub fn subscribe_boxed(
        &self,
        matcher: Box<dyn Matcher>,
    ) -> Result<Poller<T>, BrokerError> {
        let mut state = self.state.write();

        if state.closed {
            match self.config.after_close {
                AfterClose::Reject => {
                    debug!(?matcher, "subscribe rejected: broker is closed");
                    return Err(BrokerError::Closed);
                }
                AfterClose::Accept => {
                    warn!(?matcher, "subscribe after close accepted, broker reopened");
                    state.closed = false;
                }
            }
        }

        let queue = Queue::new();
        let poller = queue.poller();
        debug!(?matcher, subscribers = state.entries.len() + 1, "subscribed");

        state.entries.push(Entry { matcher, queue });
        state.cache.invalidate();

        Ok(poller)
    }
}

impl<T> Registry<T> {
    fn matchers(&self) -> impl Iterator<Item = &dyn Matcher> {
        self.entries.iter().map(|e| e.matcher.as_ref())
    }

    fn select(
        &self,
        mask: &[bool],
    ) -> Vec<Queue<T>> {
        self.entries
            .iter()
            .zip(mask)
            .filter(|(_, matched)| **matched)
            .map(|(entry, _)| entry.queue.clone())
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<T> Default for Broker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Broker<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = self.state.read();
        let matchers: Vec<_> = state.entries.iter().map(|e| &e.matcher).collect();
        f.debug_struct("Broker")
            .field("matchers", &matchers)
            .field("cached_topics", &state.cache.len())
            .field("closed", &state.closed)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
