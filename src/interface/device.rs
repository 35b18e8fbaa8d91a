//! Transaction engine built on top of `embedded-hal` `SpiDevice`.
//!
//! Here the HAL (or `embedded-hal-bus`) owns chip-select: the `SpiDevice`
//! contract asserts it before the first operation and releases it after the
//! last one, including when an operation fails. The setup and hold delays are
//! encoded as in-transaction delay operations so they land inside the frame.

use embedded_hal::spi::{Operation, SpiDevice};

use super::Exchange;
use crate::config::Config;
use crate::error::{Error, Result};

const NANOS_PER_MICRO: u32 = 1_000;

/// ADC transaction engine over an [`SpiDevice`].
pub struct DeviceEngine<SPI> {
    spi: SPI,
    config: Config,
}

impl<SPI> DeviceEngine<SPI> {
    /// Creates a new engine, validating the timing configuration.
    pub fn new(spi: SPI, config: Config) -> Result<Self, SPI::Error>
    where
        SPI: SpiDevice,
    {
        config.validate().map_err(|_| Error::InvalidConfig)?;
        Ok(Self { spi, config })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provides mutable access to the wrapped SPI device.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the engine and returns the owned SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Exchange for DeviceEngine<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    fn exchange(&mut self, word: u16) -> Result<u16, Self::Error> {
        let mut buf = word.to_be_bytes();
        let mut operations = [
            Operation::DelayNs(self.config.cs_setup_us.saturating_mul(NANOS_PER_MICRO)),
            Operation::TransferInPlace(&mut buf),
            Operation::DelayNs(self.config.cs_hold_us.saturating_mul(NANOS_PER_MICRO)),
        ];
        self.spi.transaction(&mut operations)?;

        let reply = u16::from_be_bytes(buf);
        trace!("exchange {:#x} -> {:#x}", word, reply);
        Ok(reply)
    }
}
