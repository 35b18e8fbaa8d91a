//! Error handling primitives for the acquisition driver.

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
///
/// `E` is the error type of the underlying bus backend. The ADC protocol itself
/// carries no acknowledgment or checksum, so a disconnected device is never
/// reported here: it reads back as a plausible word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// The chip-select line could not be driven.
    ChipSelect(embedded_hal::digital::ErrorKind),
    /// The operator console failed while reading or writing.
    Console(embedded_io::ErrorKind),
    /// The operator console reached end of input before a line was read.
    EndOfInput,
    /// The channel-selection collaborator rejected a channel.
    Selector,
    /// The provided configuration parameters are invalid.
    InvalidConfig,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
