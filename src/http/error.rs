#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Not a valid HTTP redirect status: {0}")]
    InvalidRedirectStatus(String),

    #[error("Unable to write to the response body")]
    UnableToWriteBody,

    #[error("Invalid value {value:?} for setting {key}")]
    InvalidConfig { key: String, value: String },

    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),
}
