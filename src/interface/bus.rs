//! Transaction engine that owns the raw SPI bus and the chip-select line.
//!
//! This is the backend to use when the HAL hands out an [`SpiBus`] and a plain
//! GPIO for chip-select. Every exchange runs inside a [`BusSession`], which
//! guarantees the chip-select line is released however the exchange ends.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::spi::SpiBus;

use super::Exchange;
use crate::config::Config;
use crate::error::{Error, Result};

/// Scoped ownership of the bus and chip-select for one transaction.
///
/// Opening a session drives no lines. Chip-select is asserted by
/// [`select`](Self::select) and released by [`close`](Self::close); if the
/// session is dropped while still selected, the line is released on drop.
pub struct BusSession<'a, BUS, CS>
where
    CS: OutputPin,
{
    bus: &'a mut BUS,
    cs: &'a mut CS,
    selected: bool,
}

impl<'a, BUS, CS> BusSession<'a, BUS, CS>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
{
    /// Starts a session over the given bus and chip-select line.
    pub fn open(bus: &'a mut BUS, cs: &'a mut CS) -> Self {
        Self {
            bus,
            cs,
            selected: false,
        }
    }

    /// Asserts chip-select (drives it low).
    pub fn select(&mut self) -> Result<(), BUS::Error> {
        if self.selected {
            return Ok(());
        }

        self.cs.set_low().map_err(|err| Error::ChipSelect(err.kind()))?;
        self.selected = true;
        Ok(())
    }

    /// Returns `true` while chip-select is asserted.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Full-duplex transfer: `words` is shifted out and replaced by the reply.
    pub fn transfer(&mut self, words: &mut [u8]) -> Result<(), BUS::Error> {
        self.bus.transfer_in_place(words)?;
        self.bus.flush()?;
        Ok(())
    }

    /// Releases chip-select (drives it high).
    pub fn deselect(&mut self) -> Result<(), BUS::Error> {
        if !self.selected {
            return Ok(());
        }

        self.selected = false;
        self.cs.set_high().map_err(|err| Error::ChipSelect(err.kind()))
    }

    /// Ends the session, releasing chip-select if it is still asserted.
    pub fn close(mut self) -> Result<(), BUS::Error> {
        self.deselect()
    }
}

impl<BUS, CS> Drop for BusSession<'_, BUS, CS>
where
    CS: OutputPin,
{
    fn drop(&mut self) {
        if self.selected {
            let _ = self.cs.set_high();
        }
    }
}

/// ADC transaction engine over an owned [`SpiBus`], chip-select pin and delay.
pub struct BusEngine<BUS, CS, D> {
    bus: BUS,
    cs: CS,
    delay: D,
    config: Config,
}

impl<BUS, CS, D> BusEngine<BUS, CS, D> {
    /// Creates a new engine, validating the timing configuration.
    ///
    /// Call [`init`](Self::init) before the first exchange.
    pub fn new(bus: BUS, cs: CS, delay: D, config: Config) -> Result<Self, BUS::Error>
    where
        BUS: SpiBus<u8>,
    {
        config.validate().map_err(|_| Error::InvalidConfig)?;
        Ok(Self {
            bus,
            cs,
            delay,
            config,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the engine and returns the owned peripherals.
    pub fn release(self) -> (BUS, CS, D) {
        (self.bus, self.cs, self.delay)
    }
}

impl<BUS, CS, D> BusEngine<BUS, CS, D>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    /// Parks chip-select in its released state.
    pub fn init(&mut self) -> Result<(), BUS::Error> {
        self.cs.set_high().map_err(|err| Error::ChipSelect(err.kind()))?;
        debug!("bus engine ready at {} Hz", self.config.clock_hz);
        Ok(())
    }
}

impl<BUS, CS, D> Exchange for BusEngine<BUS, CS, D>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    type Error = BUS::Error;

    fn exchange(&mut self, word: u16) -> Result<u16, Self::Error> {
        let mut buf = word.to_be_bytes();

        let mut session = BusSession::open(&mut self.bus, &mut self.cs);
        session.select()?;
        self.delay.delay_us(self.config.cs_setup_us);

        let transferred = session.transfer(&mut buf);

        // Hold applies even after a failed transfer so the ADC sees a clean frame.
        self.delay.delay_us(self.config.cs_hold_us);
        let released = session.close();

        transferred?;
        released?;

        let reply = u16::from_be_bytes(buf);
        trace!("exchange {:#x} -> {:#x}", word, reply);
        Ok(reply)
    }
}
