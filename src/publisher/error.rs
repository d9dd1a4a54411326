//! Publisher error type

use crate::network::error::Error as NetworkError;

/// Everything that can stop a publish before a status code is known.
///
/// A slow or silent server is *not* an error: it is reported as status
/// [`TIMEOUT_STATUS`](crate::network::application::http::response::TIMEOUT_STATUS).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The transport could not connect; nothing was sent.
    ConnectionRefused,
    /// The transport failed or stalled while the request was being written.
    WriteError,
    /// A single token group is larger than the whole transmit buffer.
    BufferOverflow,
    /// `publish` was called with no records.
    EmptyPayload,
    /// A record name or value cannot be embedded verbatim in the JSON body.
    InvalidRecord,
    /// An epoch does not have exactly ten digits.
    EpochOutOfRange,
    /// `begin` was never called, so there is no feed id or API key.
    MissingIdentity,
    /// Host, port or endpoint settings are unusable.
    InvalidConfig,
}

impl Error {
    /// Negative sentinel for callers that keep the integer status convention.
    ///
    /// Never collides with an HTTP status or with the `0`/`504` results.
    pub fn code(&self) -> i16 {
        match self {
            Error::ConnectionRefused => -1,
            Error::WriteError => -2,
            Error::BufferOverflow => -3,
            Error::EmptyPayload => -4,
            Error::InvalidRecord => -5,
            Error::EpochOutOfRange => -6,
            Error::MissingIdentity => -7,
            Error::InvalidConfig => -8,
        }
    }
}

impl From<NetworkError> for Error {
    fn from(error: NetworkError) -> Self {
        match error {
            NetworkError::BufferOverflow => Error::BufferOverflow,
            NetworkError::InvalidAddress => Error::InvalidConfig,
            NetworkError::ConnectionRefused | NetworkError::Timeout => Error::ConnectionRefused,
            NetworkError::NotOpen | NetworkError::WriteError | NetworkError::ReadError => {
                Error::WriteError
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::EmptyPayload => defmt::write!(f, "EmptyPayload"),
            Error::InvalidRecord => defmt::write!(f, "InvalidRecord"),
            Error::EpochOutOfRange => defmt::write!(f, "EpochOutOfRange"),
            Error::MissingIdentity => defmt::write!(f, "MissingIdentity"),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
        }
    }
}
