pub mod config;
pub mod error;
pub mod kalshi;
pub mod logging;

pub use config::{ApiCredentials, ApiKey, AppConfig, ConfigSource};
pub use error::{ApiError, KalshiResult, TransportError};
pub use kalshi::KalshiClient;
pub use logging::BotLogger;
