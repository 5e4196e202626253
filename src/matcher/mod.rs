//! Матчеры топиков.
//!
//! Брокер не знает, как именно сравниваются топики: подписка
//! регистрирует любой тип, реализующий [`Matcher`]. В крейте есть три
//! реализации:
//!
//! - [`ExactMatcher`]: точное совпадение строки;
//! - [`GlobMatcher`]: glob-шаблон (`news.*`, `a?c`);
//! - [`RegexMatcher`]: регулярное выражение.

mod pattern;

use std::{any::Any, fmt};

pub use pattern::{GlobMatcher, RegexMatcher};

/// Предикат над именами топиков.
pub trait Matcher: Send + Sync + fmt::Debug + 'static {
    /// Возвращает `true`, если топик интересен подписчику.
    fn matches(
        &self,
        topic: &str,
    ) -> bool;

    fn as_any(&self) -> &dyn Any;

    /// Сравнение матчеров, по которому `close_topic` находит подписку.
    fn same_as(
        &self,
        other: &dyn Matcher,
    ) -> bool;
}

/// Реализация [`Matcher::same_as`] для матчеров с `PartialEq`:
/// равны матчеры одного типа с равными значениями.
pub fn same_matcher<M>(
    this: &M,
    other: &dyn Matcher,
) -> bool
where
    M: Matcher + PartialEq,
{
    other
        .as_any()
        .downcast_ref::<M>()
        .is_some_and(|other| other == this)
}

/// Точное совпадение имени топика.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExactMatcher(String);

impl ExactMatcher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }

    pub fn topic(&self) -> &str {
        &self.0
    }
}

impl Matcher for ExactMatcher {
    fn matches(
        &self,
        topic: &str,
    ) -> bool {
        self.0 == topic
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(
        &self,
        other: &dyn Matcher,
    ) -> bool {
        same_matcher(self, other)
    }
}

impl From<&str> for ExactMatcher {
    fn from(topic: &str) -> Self {
        Self::new(topic)
    }
}

impl From<String> for ExactMatcher {
    fn from(topic: String) -> Self {
        Self(topic)
    }
}

impl fmt::Display for ExactMatcher {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
