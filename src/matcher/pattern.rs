use std::{any::Any, fmt};

use globset::Glob;
use regex::Regex;

use super::{same_matcher, Matcher};
use crate::error::BrokerError;

/// Подписка по glob-шаблону, например `"kin.*"` или `"a?c"`.
///
/// Два `GlobMatcher` равны, если равен исходный текст шаблона.
#[derive(Clone)]
pub struct GlobMatcher {
    glob: Glob,
    compiled: globset::GlobMatcher,
}

/// Подписка по регулярному выражению.
///
/// Выражение не заякорено: `"^orders\."` и `"orders\."` дают разный
/// результат. Равенство по тексту выражения.
#[derive(Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

////////////////////////////////////////////////////////////////////////////////
// GlobMatcher
////////////////////////////////////////////////////////////////////////////////

impl GlobMatcher {
    /// Компилирует glob-шаблон.
    ///
    /// # Ошибки
    /// `BrokerError::InvalidPattern`, если шаблон некорректен.
    pub fn new(pattern: &str) -> Result<Self, BrokerError> {
        let glob = Glob::new(pattern)?;
        let compiled = glob.compile_matcher();
        Ok(Self { glob, compiled })
    }

    pub fn pattern(&self) -> &str {
        self.glob.glob()
    }
}

impl Matcher for GlobMatcher {
    fn matches(
        &self,
        topic: &str,
    ) -> bool {
        self.compiled.is_match(topic)
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

impl PartialEq for GlobMatcher {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.glob == other.glob
    }
}

impl Eq for GlobMatcher {}

impl fmt::Debug for GlobMatcher {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("GlobMatcher").field(&self.pattern()).finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// RegexMatcher
////////////////////////////////////////////////////////////////////////////////

impl RegexMatcher {
    /// Компилирует регулярное выражение.
    ///
    /// # Ошибки
    /// `BrokerError::InvalidPattern`, если выражение некорректно.
    pub fn new(pattern: &str) -> Result<Self, BrokerError> {
        let regex = Regex::new(pattern).map_err(|e| BrokerError::invalid_pattern(pattern, e))?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for RegexMatcher {
    fn matches(
        &self,
        topic: &str,
    ) -> bool {
        self.regex.is_match(topic)
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

impl PartialEq for RegexMatcher {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for RegexMatcher {}

impl fmt::Debug for RegexMatcher {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("RegexMatcher").field(&self.pattern()).finish()
    }
}
