use std::error::Error as StdError;
use std::fmt;

use crate::binder::BindError;
use crate::config::ConfigError;
use crate::scanner::ScanError;
use crate::transport::TransportError;

/// Startup failure of an event application.
///
/// Everything here is fatal: the application stops before serving traffic.
/// Per-message failures never surface as this type.
#[derive(Debug)]
pub enum Error {
    Scan(ScanError),
    Bind(BindError),
    Transport(TransportError),
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Scan(e) => write!(f, "scan failed: {}", e),
            Error::Bind(e) => write!(f, "bind failed: {}", e),
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Scan(e) => Some(e),
            Error::Bind(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        Error::Scan(err)
    }
}

impl From<BindError> for Error {
    fn from(err: BindError) -> Self {
        Error::Bind(err)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}
