use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчики брокера.
#[derive(Debug, Default)]
pub(crate) struct BrokerStats {
    /// Общее количество вызовов `publish`
    publish_count: AtomicU64,
    /// Значения, принятые очередями подписчиков
    delivered: AtomicU64,
    /// Значения, отклонённые закрытыми очередями
    dropped: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Снимок счётчиков.
///
/// # Поля
/// * `publish_count` - кол-во вызовов `publish`.
/// * `delivered` - кол-во значений, принятых очередями.
/// * `dropped` - кол-во значений, которые не приняла закрытая очередь.
/// * `cache_hits` / `cache_misses` - обращения к кэшу матчинга.
/// * `cache_invalidations` - сколько раз кэш очищался.
/// * `subscribers` - текущее число подписок.
/// * `cached_topics` - текущее число топиков в кэше.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStatsSnapshot {
    pub publish_count: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_invalidations: u64,
    pub subscribers: usize,
    pub cached_topics: usize,
}

impl BrokerStats {
    pub(crate) fn record_publish(&self) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(
        &self,
        count: u64,
    ) {
        self.delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(
        &self,
        count: u64,
    ) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        cache_invalidations: u64,
        subscribers: usize,
        cached_topics: usize,
    ) -> BrokerStatsSnapshot {
        BrokerStatsSnapshot {
            publish_count: self.publish_count.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_invalidations,
            subscribers,
            cached_topics,
        }
    }
}
