//! Bus transaction backends for the ADC.

pub mod bitbang;
pub mod bus;
pub mod device;

use crate::error::Result;

/// One complete chip-select framed word exchange with the ADC.
///
/// Implementations shift `word` out most-significant bit first while shifting
/// the reply in, honouring the chip-select setup and hold delays. Chip-select
/// must be released before returning, whether or not the transfer succeeded.
pub trait Exchange {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Exchanges a single 16-bit word and returns the word clocked in.
    fn exchange(&mut self, word: u16) -> Result<u16, Self::Error>;
}

impl<T: Exchange + ?Sized> Exchange for &mut T {
    type Error = T::Error;

    fn exchange(&mut self, word: u16) -> Result<u16, Self::Error> {
        T::exchange(self, word)
    }
}
