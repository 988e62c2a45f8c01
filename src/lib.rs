pub mod config;
pub mod exec;
pub mod logging;
pub mod net;

pub use config::Config;
pub use exec::ExecError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RcatError {
    #[error("failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, #[source] std::io::Error),

    #[error("failed to connect to {0}: {1}")]
    Connect(String, #[source] std::io::Error),

    #[error("cannot resolve address {0}")]
    Resolve(String),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("received text was not valid UTF-8")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RcatError>;
