use std::sync::Arc;

use ahash::AHashMap;

use crate::matcher::Matcher;

/// Кэш результатов матчинга: топик → маска по записям реестра.
///
/// `mask[i]` - результат `matches` i-й записи реестра. Маска валидна
/// только для того реестра, по которому построена, поэтому любое
/// изменение реестра очищает кэш целиком.
#[derive(Debug, Default)]
pub(crate) struct MatchCache {
    topics: AHashMap<Arc<str>, Arc<[bool]>>,
    /// Максимум топиков, `0` - без ограничения.
    capacity: usize,
    invalidations: u64,
}

impl MatchCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            topics: AHashMap::new(),
            capacity,
            invalidations: 0,
        }
    }

    pub(crate) fn get(
        &self,
        topic: &str,
    ) -> Option<Arc<[bool]>> {
        self.topics.get(topic).cloned()
    }

    /// Возвращает маску для топика, вычисляя её по `matchers` при
    /// промахе.
    pub(crate) fn get_or_populate<'a, I>(
        &mut self,
        topic: &str,
        matchers: I,
    ) -> Arc<[bool]>
    where
        I: IntoIterator<Item = &'a dyn Matcher>,
    {
        if let Some(mask) = self.topics.get(topic) {
            return Arc::clone(mask);
        }

        if self.capacity > 0 && self.topics.len() >= self.capacity {
            self.invalidate();
        }

        let mask = evaluate(topic, matchers);
        self.topics.insert(Arc::from(topic), Arc::clone(&mask));
        mask
    }

    pub(crate) fn invalidate(&mut self) {
        if !self.topics.is_empty() {
            self.topics.clear();
            self.invalidations += 1;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.topics.len()
    }

    pub(crate) fn invalidations(&self) -> u64 {
        self.invalidations
    }
}

/// Прогоняет топик через все матчеры, без кэша.
pub(crate) fn evaluate<'a, I>(
    topic: &str,
    matchers: I,
) -> Arc<[bool]>
where
    I: IntoIterator<Item = &'a dyn Matcher>,
{
    matchers.into_iter().map(|m| m.matches(topic)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{ExactMatcher, GlobMatcher};

    fn registry() -> Vec<Box<dyn Matcher>> {
        vec![
            Box::new(ExactMatcher::new("a")),
            Box::new(GlobMatcher::new("a*").unwrap()),
            Box::new(ExactMatcher::new("b")),
        ]
    }

    fn refs(matchers: &[Box<dyn Matcher>]) -> impl Iterator<Item = &dyn Matcher> {
        matchers.iter().map(|m| m.as_ref())
    }

    #[test]
    fn test_populate_and_hit() {
        let matchers = registry();
        let mut cache = MatchCache::new(0);

        assert!(cache.get("a").is_none());
        let mask = cache.get_or_populate("a", refs(&matchers));
        assert_eq!(&*mask, &[true, true, false]);

        let hit = cache.get("a").unwrap();
        assert!(Arc::ptr_eq(&mask, &hit));
        assert_eq!(cache.len(), 1);
    }

    /// Тест проверяет, что при достижении лимита кэш очищается перед
    /// вставкой нового топика.
    #[test]
    fn test_capacity_clears_cache() {
        let matchers = registry();
        let mut cache = MatchCache::new(2);

        cache.get_or_populate("a", refs(&matchers));
        cache.get_or_populate("b", refs(&matchers));
        assert_eq!(cache.len(), 2);

        cache.get_or_populate("abc", refs(&matchers));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert_eq!(&*cache.get("abc").unwrap(), &[false, true, false]);
        assert_eq!(cache.invalidations(), 1);
    }

    #[test]
    fn test_invalidate_counts_only_non_empty() {
        let matchers = registry();
        let mut cache = MatchCache::new(0);

        cache.invalidate();
        assert_eq!(cache.invalidations(), 0);

        cache.get_or_populate("b", refs(&matchers));
        cache.invalidate();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.invalidations(), 1);
    }
}
