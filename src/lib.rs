/// Topic broker: registry of matchers, fan-out and match cache.
pub mod broker;
/// Broker and logging configuration loading.
pub mod config;
/// Error types: push/poll outcomes and broker errors.
pub mod error;
/// Logging setup (filters, formats).
pub mod logging;
/// Topic matchers: exact, glob and regex.
pub mod matcher;
/// Unbounded FIFO queue with a waiting pull interface.
pub mod queue;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Broker API.
pub use broker::{Broker, BrokerStatsSnapshot};
/// Configuration.
pub use self::config::{AfterClose, BrokerConfig, Settings};
/// Operation errors.
pub use error::{BrokerError, PollError, PushError, TryPollError};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Matchers.
pub use matcher::{ExactMatcher, GlobMatcher, Matcher, RegexMatcher};
/// Queue API.
pub use queue::{Poller, Queue};
