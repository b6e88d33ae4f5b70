use thiserror::Error;

/// Errors surfaced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport could not reach the device, or dropped the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The device rejected the configured PIN.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The operation requires an open session.
    #[error("not connected")]
    NotConnected,

    /// A field name outside the documented vocabulary.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A value the device cannot represent.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// The device returned bytes that do not match the characteristic layout.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<bluest::Error> for Error {
    fn from(err: bluest::Error) -> Self {
        Error::Connection(err.to_string())
    }
}

impl Error {
    /// Prefix transport and decode errors with the field they occurred on,
    /// so batch operations report which field failed.
    pub(crate) fn for_field(self, field: &str) -> Error {
        match self {
            Error::Connection(msg) => Error::Connection(format!("{field}: {msg}")),
            Error::Protocol(msg) => Error::Protocol(format!("{field}: {msg}")),
            other => other,
        }
    }
}
