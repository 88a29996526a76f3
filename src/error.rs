use thiserror::Error;

#[derive(Debug, Error)]
pub enum NifError {
    #[error("host symbol `{0}` was not found in the running VM")]
    MissingHostSymbol(&'static str),

    #[error("resolving the host API is not supported on this platform")]
    UnsupportedPlatform,

    #[error("logging already initialized by another logger")]
    LoggerAlreadyInstalled,

    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

pub type Result<T> = std::result::Result<T, NifError>;
