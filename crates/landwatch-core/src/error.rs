//! Error type shared by every landwatch crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Undecodable or empty image
    #[error("image: {0}")]
    Image(String),

    /// Untrained model, unexpected tensor output, bad architecture
    #[error("model: {0}")]
    Model(String),

    /// Training inputs that cannot be fitted (empty, mismatched, out of range)
    #[error("data: {0}")]
    Data(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("serialization: {0}")]
    Serialization(String),

    /// Caller passed a value of the wrong shape, typically a feature row
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
