//! Acquisition loop driving the transaction engine from the operator console.

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, Write};
use heapless::Vec;

use crate::channel::{CHANNEL_COUNT, ChannelAddress, ChannelSelector};
use crate::config::Config;
use crate::console;
use crate::error::{Error, Result};
use crate::interface::Exchange;
use crate::word::RawWord;

/// Outcome of one console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionReport {
    /// Count entered by the operator after parsing (zero if unparseable).
    pub requested: u32,
    /// Transactions issued during the session.
    pub transactions: u32,
    /// Transactions whose exchange reported an error.
    pub failures: u32,
}

/// Word read from one channel during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Channel the word was read from.
    pub channel: ChannelAddress,
    /// Received word, or `None` if the exchange failed.
    pub word: Option<RawWord>,
}

/// Readings of a full sweep, indexed by [`ChannelAddress::index`].
pub type ScanReadings = Vec<Reading, CHANNEL_COUNT>;

/// Single-threaded acquisition driver.
///
/// Owns the transaction engine and the delay used for the iteration cadence.
/// Nothing else may touch the bus while a session or scan is running.
pub struct Acquisition<X, D> {
    engine: X,
    delay: D,
    config: Config,
    transactions: u32,
}

impl<X, D> Acquisition<X, D> {
    /// Creates a new acquisition driver, validating the cadence and timing.
    pub fn new(engine: X, delay: D, config: Config) -> Result<Self, X::Error>
    where
        X: Exchange,
    {
        config.validate().map_err(|_| Error::InvalidConfig)?;
        Ok(Self {
            engine,
            delay,
            config,
            transactions: 0,
        })
    }

    /// Total transactions issued since construction.
    pub fn transactions(&self) -> u32 {
        self.transactions
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provides mutable access to the transaction engine.
    pub fn engine_mut(&mut self) -> &mut X {
        &mut self.engine
    }

    /// Consumes the driver and returns the engine and delay.
    pub fn release(self) -> (X, D) {
        (self.engine, self.delay)
    }
}

impl<X, D> Acquisition<X, D>
where
    X: Exchange,
    D: DelayNs,
{
    /// Runs one console session.
    ///
    /// Prompts, blocks for a repeat count `N`, then issues `N` transactions
    /// whose payloads count up from the configured base, reporting each reply.
    /// A failed exchange is reported and the session carries on with the next
    /// iteration.
    pub fn run_session<C>(&mut self, console: &mut C) -> Result<SessionReport, X::Error>
    where
        C: Read + Write,
    {
        console::write_prompt(console)?;
        let requested = console::read_count(console)?;

        let mut report = SessionReport {
            requested,
            ..SessionReport::default()
        };
        if requested == 0 {
            return Ok(report);
        }

        info!("session: {} transactions", requested);
        for index in 1..=requested {
            if index > 1 {
                self.delay.delay_ms(self.config.iteration_delay_ms);
            }

            let payload = self.config.payload_for(index);
            let outcome = self.engine.exchange(payload);
            self.transactions = self.transactions.wrapping_add(1);
            report.transactions += 1;

            match outcome {
                Ok(word) => console::write_reading(console, word, index)?,
                Err(_) => {
                    report.failures += 1;
                    warn!("exchange {} of {} failed", index, requested);
                    console::write_failure(console, index)?;
                }
            }
        }

        console::end_session(console)?;
        Ok(report)
    }

    /// Runs console sessions back to back. Only returns on a console error.
    pub fn run<C>(&mut self, console: &mut C) -> Result<core::convert::Infallible, X::Error>
    where
        C: Read + Write,
    {
        loop {
            let report = self.run_session(console)?;
            debug!(
                "session done: {} of {} failed",
                report.failures,
                report.transactions
            );
        }
    }

    /// Reads every instrumented channel once, in index order.
    ///
    /// `selector` routes the bus to each channel before its transaction and is
    /// deselected once the sweep ends. Exchange failures are recorded per
    /// channel; a selector failure aborts the sweep.
    pub fn scan<S>(&mut self, selector: &mut S) -> Result<ScanReadings, X::Error>
    where
        S: ChannelSelector,
    {
        let mut readings = ScanReadings::new();

        for channel in ChannelAddress::all() {
            if selector.select(channel).is_err() {
                error!("selector rejected channel {}", channel.index());
                let _ = selector.deselect();
                return Err(Error::Selector);
            }

            let word = self.engine.exchange(self.config.base_payload).ok().map(RawWord);
            self.transactions = self.transactions.wrapping_add(1);
            match word {
                None => warn!("channel {} read failed", channel.index()),
                Some(raw) if raw.is_railed() => {
                    debug!("channel {} railed at {}", channel.index(), raw.sample())
                }
                Some(_) => {}
            }

            // Capacity equals the channel count.
            let _ = readings.push(Reading { channel, word });
        }

        selector.deselect().map_err(|_| Error::Selector)?;
        Ok(readings)
    }
}
