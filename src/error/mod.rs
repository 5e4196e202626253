pub mod broker;
pub mod queue;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы
// упростить доступ к ним из внешнего кода.
pub use broker::BrokerError;
pub use queue::{PollError, PushError, TryPollError};
