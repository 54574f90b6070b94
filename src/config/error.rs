#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("must provide a graphite carbon-cache host")]
    MissingHost,
    #[error("poll interval must be at least one second")]
    ZeroInterval,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
