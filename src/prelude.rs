use miette::Diagnostic;
use std::fmt::Display;
use thiserror::Error;

pub use crate::client::ClientError;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    ClientError(#[from] ClientError),

    #[error("server error: {0}")]
    ServerError(String),
}

impl Error {
    pub fn config(text: impl Display) -> Error {
        Error::ConfigError(text.to_string())
    }

    pub fn server(error: impl Display) -> Error {
        Error::ServerError(error.to_string())
    }
}
