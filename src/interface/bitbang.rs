//! GPIO bit-banged SPI bus speaking the ADC's wire format.
//!
//! Mode 0 only: the clock idles low, data out changes while the clock is low
//! and data in is sampled on the rising edge. Bits go out most-significant
//! first. Pair it with [`BusEngine`](super::bus::BusEngine) for chip-select
//! handling and transaction timing.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::{self, ErrorType, SpiBus};

use crate::config::Config;

/// Error type for the bit-banged bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitBangError {
    /// The clock line could not be driven.
    Clock,
    /// The data-out line could not be driven.
    DataOut,
    /// The data-in line could not be read.
    DataIn,
}

impl spi::Error for BitBangError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// Software SPI master over three GPIO lines.
pub struct BitBangBus<SCK, MOSI, MISO, D> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    delay: D,
    half_period_ns: u32,
}

impl<SCK, MOSI, MISO, D> BitBangBus<SCK, MOSI, MISO, D>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    D: DelayNs,
{
    /// Creates the bus and drives the clock to its idle (low) level.
    pub fn new(
        mut sck: SCK,
        mosi: MOSI,
        miso: MISO,
        delay: D,
        config: &Config,
    ) -> Result<Self, BitBangError> {
        sck.set_low().map_err(|_| BitBangError::Clock)?;
        Ok(Self {
            sck,
            mosi,
            miso,
            delay,
            half_period_ns: config.half_period_ns(),
        })
    }

    /// Consumes the bus and returns the owned pins and delay.
    pub fn release(self) -> (SCK, MOSI, MISO, D) {
        (self.sck, self.mosi, self.miso, self.delay)
    }

    fn exchange_byte(&mut self, out: u8) -> Result<u8, BitBangError> {
        let mut input = 0u8;

        for bit in (0..8).rev() {
            if (out >> bit) & 1 == 1 {
                self.mosi.set_high().map_err(|_| BitBangError::DataOut)?;
            } else {
                self.mosi.set_low().map_err(|_| BitBangError::DataOut)?;
            }
            self.delay.delay_ns(self.half_period_ns);

            self.sck.set_high().map_err(|_| BitBangError::Clock)?;
            if self.miso.is_high().map_err(|_| BitBangError::DataIn)? {
                input |= 1 << bit;
            }
            self.delay.delay_ns(self.half_period_ns);

            self.sck.set_low().map_err(|_| BitBangError::Clock)?;
        }

        Ok(input)
    }
}

impl<SCK, MOSI, MISO, D> ErrorType for BitBangBus<SCK, MOSI, MISO, D> {
    type Error = BitBangError;
}

impl<SCK, MOSI, MISO, D> SpiBus<u8> for BitBangBus<SCK, MOSI, MISO, D>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    D: DelayNs,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.exchange_byte(0x00)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.exchange_byte(word)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for index in 0..len {
            let out = write.get(index).copied().unwrap_or(0x00);
            let input = self.exchange_byte(out)?;
            if let Some(slot) = read.get_mut(index) {
                *slot = input;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.exchange_byte(*word)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BitBangBus;
    use crate::config::Config;
    use crate::interface::Exchange;
    use crate::interface::bus::{BusEngine, BusSession};
    use crate::testing::RecordingDelay;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
    use embedded_hal::spi::SpiBus;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
    use std::rc::Rc;

    /// Clock line that counts rising edges and remembers its level.
    #[derive(Clone, Default)]
    struct ClockProbe {
        high: Rc<Cell<bool>>,
        rising_edges: Rc<Cell<usize>>,
        writes: Rc<Cell<usize>>,
    }

    impl ErrorType for ClockProbe {
        type Error = Infallible;
    }

    impl OutputPin for ClockProbe {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high.set(false);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            if !self.high.get() {
                self.rising_edges.set(self.rising_edges.get() + 1);
            }
            self.high.set(true);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }

    /// Data-out line wired straight back to data-in.
    #[derive(Clone, Default)]
    struct Loopback {
        level: Rc<Cell<bool>>,
        writes: Rc<Cell<usize>>,
    }

    impl ErrorType for Loopback {
        type Error = Infallible;
    }

    impl OutputPin for Loopback {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.level.set(false);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.level.set(true);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }

    impl InputPin for Loopback {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.level.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.level.get())
        }
    }

    fn loopback_bus(
        delay: RecordingDelay,
    ) -> (
        BitBangBus<ClockProbe, Loopback, Loopback, RecordingDelay>,
        ClockProbe,
        Loopback,
    ) {
        let sck = ClockProbe::default();
        let line = Loopback::default();
        let bus = BitBangBus::new(
            sck.clone(),
            line.clone(),
            line.clone(),
            delay,
            &Config::default(),
        )
        .unwrap();
        (bus, sck, line)
    }

    #[test]
    fn new_parks_clock_low() {
        let (_bus, sck, line) = loopback_bus(RecordingDelay::new());
        assert!(!sck.high.get());
        assert_eq!(sck.writes.get(), 1);
        assert_eq!(line.writes.get(), 0);
    }

    #[test]
    fn transfer_clocks_sixteen_bits_msb_first() {
        let delay = RecordingDelay::new();
        let (mut bus, sck, _line) = loopback_bus(delay.clone());

        let mut words = [0x10, 0x00];
        bus.transfer_in_place(&mut words).unwrap();

        assert_eq!(words, [0x10, 0x00]);
        assert_eq!(sck.rising_edges.get(), 16);
        assert!(!sck.high.get());
        // Two half periods of 500 ns per bit at 1 MHz.
        assert_eq!(delay.calls().len(), 32);
        assert_eq!(delay.total_ns(), 16_000);
    }

    #[test]
    fn samples_data_in_on_rising_edge() {
        let sck = ClockProbe::default();
        let mosi = Loopback::default();
        let miso = PinMock::new(&[
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
        ]);
        let mut bus = BitBangBus::new(
            sck.clone(),
            mosi,
            miso,
            RecordingDelay::new(),
            &Config::default(),
        )
        .unwrap();

        let mut word = [0u8; 1];
        bus.read(&mut word).unwrap();
        assert_eq!(word, [0b1010_0001]);

        let (_, _, mut miso, _) = bus.release();
        miso.done();
    }

    #[test]
    fn uneven_transfer_pads_and_truncates() {
        let (mut bus, sck, _line) = loopback_bus(RecordingDelay::new());

        let mut read = [0u8; 1];
        bus.transfer(&mut read, &[0xA5, 0x5A]).unwrap();

        assert_eq!(read, [0xA5]);
        assert_eq!(sck.rising_edges.get(), 16);
    }

    #[test]
    fn session_without_exchange_leaks_no_clock_pulses() {
        let (mut bus, sck, line) = loopback_bus(RecordingDelay::new());
        let mut cs = PinMock::new(&[]);

        BusSession::open(&mut bus, &mut cs).close().unwrap();

        assert_eq!(sck.rising_edges.get(), 0);
        assert_eq!(sck.writes.get(), 1);
        assert_eq!(line.writes.get(), 0);
        cs.done();
    }

    #[test]
    fn engine_over_bitbang_loops_word_back() {
        let (bus, sck, _line) = loopback_bus(RecordingDelay::new());
        let cs = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut engine =
            BusEngine::new(bus, cs, RecordingDelay::new(), Config::default()).unwrap();

        assert_eq!(engine.exchange(0x1ABC).unwrap(), 0x1ABC);
        assert_eq!(sck.rising_edges.get(), 16);

        let (_, mut cs, _) = engine.release();
        cs.done();
    }
}
