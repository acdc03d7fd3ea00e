use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("invalid proxy format: {0}")]
    InvalidFormat(String),

    #[error("unsupported proxy scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid proxy port: {0}")]
    InvalidPort(String),
}
