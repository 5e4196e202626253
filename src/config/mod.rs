pub mod broker;
pub mod settings;

pub use broker::{AfterClose, BrokerConfig};
pub use settings::Settings;
