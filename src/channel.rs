//! Addressing of the multiplexed sensor channels across the sensor boards.
//!
//! Each sensor board carries two ADCs, and each ADC sits behind a 16-way analog
//! multiplexer of which nine inputs are populated. Five boards give the 90
//! instrumented channels. How a [`ChannelAddress`] is turned into enable and
//! address-line levels is left to a [`ChannelSelector`] implementation so the
//! bus engine never has to know about it.

use core::convert::Infallible;

/// Number of sensor boards on the bus.
pub const BOARD_COUNT: u8 = 5;
/// Number of ADCs fitted to each board.
pub const ADCS_PER_BOARD: u8 = 2;
/// Multiplexer inputs wired to a sensor.
pub const MUX_CHANNELS_USED: u8 = 9;
/// Multiplexer inputs physically available.
pub const MUX_CHANNELS_AVAILABLE: u8 = 16;
/// Total number of instrumented channels.
pub const CHANNEL_COUNT: usize =
    BOARD_COUNT as usize * ADCS_PER_BOARD as usize * MUX_CHANNELS_USED as usize;

/// Location of one temperature sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelAddress {
    board: u8,
    adc: u8,
    mux: u8,
}

impl ChannelAddress {
    /// Creates an address, rejecting coordinates outside the instrumented range.
    pub const fn new(board: u8, adc: u8, mux: u8) -> Option<Self> {
        if board < BOARD_COUNT && adc < ADCS_PER_BOARD && mux < MUX_CHANNELS_USED {
            Some(Self { board, adc, mux })
        } else {
            None
        }
    }

    /// Returns the address at position `index` in board-major order.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index >= CHANNEL_COUNT {
            return None;
        }

        let per_board = ADCS_PER_BOARD as usize * MUX_CHANNELS_USED as usize;
        let board = (index / per_board) as u8;
        let within = index % per_board;
        let adc = (within / MUX_CHANNELS_USED as usize) as u8;
        let mux = (within % MUX_CHANNELS_USED as usize) as u8;
        Some(Self { board, adc, mux })
    }

    /// Position of this address in board-major order.
    pub const fn index(self) -> usize {
        let per_board = ADCS_PER_BOARD as usize * MUX_CHANNELS_USED as usize;
        self.board as usize * per_board
            + self.adc as usize * MUX_CHANNELS_USED as usize
            + self.mux as usize
    }

    /// Board index (0..5).
    pub const fn board(self) -> u8 {
        self.board
    }

    /// ADC index within the board (0..2).
    pub const fn adc(self) -> u8 {
        self.adc
    }

    /// Multiplexer input (0..9).
    pub const fn mux(self) -> u8 {
        self.mux
    }

    /// Iterates every instrumented channel in board-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..CHANNEL_COUNT).filter_map(Self::from_index)
    }
}

/// Routes the shared bus to one sensor before a transaction.
///
/// Implementations drive board enables and multiplexer address lines. They must
/// not touch the serial bus or any chip-select line.
pub trait ChannelSelector {
    /// Error type produced while driving the selection lines.
    type Error;

    /// Makes `channel` the target of the next bus transaction.
    fn select(&mut self, channel: ChannelAddress) -> core::result::Result<(), Self::Error>;

    /// Returns the lines to a state where no channel is selected.
    fn deselect(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Selector for a bench setup with a single ADC wired directly to the bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedChannel;

impl ChannelSelector for FixedChannel {
    type Error = Infallible;

    fn select(&mut self, _channel: ChannelAddress) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

impl<S: ChannelSelector + ?Sized> ChannelSelector for &mut S {
    type Error = S::Error;

    fn select(&mut self, channel: ChannelAddress) -> core::result::Result<(), Self::Error> {
        S::select(self, channel)
    }

    fn deselect(&mut self) -> core::result::Result<(), Self::Error> {
        S::deselect(self)
    }
}
