//! Configuration primitives for the acquisition driver.

use crate::channel::CHANNEL_COUNT;

/// Maximum serial clock rate accepted by the ADC (hertz).
pub const MAX_CLOCK_HZ: u32 = 20_000_000;
/// Default serial clock rate (hertz).
pub const DEFAULT_CLOCK_HZ: u32 = 1_000_000;
/// Minimum chip-select assert to first clock edge delay (microseconds).
pub const MIN_CS_SETUP_US: u32 = 10;
/// Minimum settle delay between the last clock edge and chip-select release (microseconds).
pub const MIN_CS_HOLD_US: u32 = 100;
/// Minimum delay between consecutive console-driven transactions (milliseconds).
pub const MIN_ITERATION_DELAY_MS: u32 = 100;
/// Time allowed for one sweep over every channel (milliseconds).
pub const SCAN_BUDGET_MS: u32 = 1_000;
/// Bits clocked per transaction.
pub const WORD_BITS: u32 = 16;

/// Payload of the first transaction in a console session.
pub const DEFAULT_BASE_PAYLOAD: u16 = 0x1000;

/// User-facing configuration for the acquisition driver.
///
/// SPI mode and bit order are not configurable: the ADC only speaks
/// [`embedded_hal::spi::MODE_0`], most-significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Serial clock rate in hertz.
    pub clock_hz: u32,
    /// Delay between asserting chip-select and clocking data.
    pub cs_setup_us: u32,
    /// Delay between the end of the exchange and releasing chip-select.
    pub cs_hold_us: u32,
    /// Outbound word of the first iteration in a session.
    pub base_payload: u16,
    /// Fixed cadence between iterations of a console session.
    pub iteration_delay_ms: u32,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration respects the device timing limits.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.clock_hz == 0 || self.clock_hz > MAX_CLOCK_HZ {
            return Err(ConfigError::ClockOutOfRange);
        }

        if self.cs_setup_us < MIN_CS_SETUP_US || self.cs_hold_us < MIN_CS_HOLD_US {
            return Err(ConfigError::ChipSelectTiming);
        }

        if self.iteration_delay_ms < MIN_ITERATION_DELAY_MS {
            return Err(ConfigError::IterationTooFast);
        }

        if self.scan_time_ns() > u64::from(SCAN_BUDGET_MS) * 1_000_000 {
            return Err(ConfigError::ScanBudgetExceeded);
        }

        Ok(())
    }

    /// Half of one serial clock period in nanoseconds, rounded up.
    pub const fn half_period_ns(&self) -> u32 {
        let clock_hz = if self.clock_hz == 0 { 1 } else { self.clock_hz };
        let period = 1_000_000_000u32.div_ceil(clock_hz);
        period.div_ceil(2)
    }

    /// Estimated bus occupancy of one transaction in nanoseconds.
    pub const fn transaction_time_ns(&self) -> u64 {
        let setup = self.cs_setup_us as u64 * 1_000;
        let hold = self.cs_hold_us as u64 * 1_000;
        let clocking = WORD_BITS as u64 * 2 * self.half_period_ns() as u64;
        setup + clocking + hold
    }

    /// Estimated time to visit every instrumented channel once.
    pub const fn scan_time_ns(&self) -> u64 {
        self.transaction_time_ns() * CHANNEL_COUNT as u64
    }

    /// Outbound word for the 1-based iteration `index` of a session.
    pub const fn payload_for(&self, index: u32) -> u16 {
        self.base_payload.wrapping_add(index.wrapping_sub(1) as u16)
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the serial clock rate.
    pub fn clock_hz(mut self, clock_hz: u32) -> Self {
        self.config.clock_hz = clock_hz;
        self
    }

    /// Overrides the chip-select setup delay.
    pub fn cs_setup_us(mut self, cs_setup_us: u32) -> Self {
        self.config.cs_setup_us = cs_setup_us;
        self
    }

    /// Overrides the chip-select hold delay.
    pub fn cs_hold_us(mut self, cs_hold_us: u32) -> Self {
        self.config.cs_hold_us = cs_hold_us;
        self
    }

    /// Sets the first outbound word of a session.
    pub fn base_payload(mut self, base_payload: u16) -> Self {
        self.config.base_payload = base_payload;
        self
    }

    /// Sets the cadence between session iterations.
    pub fn iteration_delay_ms(mut self, iteration_delay_ms: u32) -> Self {
        self.config.iteration_delay_ms = iteration_delay_ms;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            cs_setup_us: MIN_CS_SETUP_US,
            cs_hold_us: MIN_CS_HOLD_US,
            base_payload: DEFAULT_BASE_PAYLOAD,
            iteration_delay_ms: MIN_ITERATION_DELAY_MS,
        }
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Clock rate is zero or above what the ADC accepts.
    ClockOutOfRange,
    /// Chip-select setup or hold delay is shorter than the device requires.
    ChipSelectTiming,
    /// Session iterations would run closer together than the fixed cadence.
    IterationTooFast,
    /// A full channel sweep would not fit the acquisition budget.
    ScanBudgetExceeded,
}
