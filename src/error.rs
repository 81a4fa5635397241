//! Boot-time error model
//!
//! Every fallible discovery operation reports one of a closed set of error
//! kinds. Nothing unwinds: failures travel back to the caller through
//! [`Result`] and `?`, and the boot sequence prints the kind's name.

use core::fmt;

/// Error kinds produced by PCI discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// No error
    Success,
    /// The device registry has no free slot left
    Full,
    /// A BAR index (or the upper half of a 64-bit BAR) is past the last slot
    IndexOutOfRange,
    /// The BAR memory type field holds the reserved encoding
    UnsupportedBarType,
    /// PCI-to-PCI bridges are nested deeper than the configured limit
    BridgeDepthExceeded,
    /// No device in the registry matched the request
    NoSuchDevice,
}

impl Error {
    /// Stable, human-readable name of this error kind
    pub const fn name(self) -> &'static str {
        match self {
            Error::Success => "Success",
            Error::Full => "Full",
            Error::IndexOutOfRange => "IndexOutOfRange",
            Error::UnsupportedBarType => "UnsupportedBarType",
            Error::BridgeDepthExceeded => "BridgeDepthExceeded",
            Error::NoSuchDevice => "NoSuchDevice",
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Error::Success)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result type used throughout the discovery layer
pub type Result<T> = core::result::Result<T, Error>;

/// A value paired with the error that produced it.
///
/// `value` is only meaningful when `error` is [`Error::Success`]. This is the
/// reporting form of a [`Result`]: it always has a name to print, including
/// on success.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithError<T> {
    pub value: T,
    pub error: Error,
}

impl<T> WithError<T> {
    pub const fn new(value: T, error: Error) -> Self {
        Self { value, error }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_success()
    }

    /// Converts back into a `Result`, discarding the value on failure
    pub fn into_result(self) -> Result<T> {
        if self.error.is_success() {
            Ok(self.value)
        } else {
            Err(self.error)
        }
    }
}

impl<T: Default> From<Result<T>> for WithError<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => WithError::new(value, Error::Success),
            Err(error) => WithError::new(T::default(), error),
        }
    }
}
