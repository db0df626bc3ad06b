use relay_broker::BrokerError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("broker: {0}")]
    Broker(#[from] BrokerError),

    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("unsupported broker backend: {0}")]
    UnsupportedBackend(String),

    #[error("logging: {0}")]
    Logging(String),
}

pub type AppResult<T> = Result<T, AppError>;
