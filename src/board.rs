//! Sensor-board enable lines.
//!
//! Every sensor board hangs off the shared bus behind its own enable line. The
//! lines are owned here as named hardware configuration rather than a global
//! table, and at most one board is ever enabled so two ADCs can never drive the
//! data-in line together.

use embedded_hal::digital::{Error as _, ErrorKind, OutputPin};

use crate::channel::{BOARD_COUNT, ChannelAddress, ChannelSelector};

const BOARDS: usize = BOARD_COUNT as usize;

/// Electrical level that enables a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnableLevel {
    /// Board is enabled while its line is high.
    ActiveHigh,
    /// Board is enabled while its line is low.
    ActiveLow,
}

/// Errors produced while driving board enable lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    /// Board index outside `0..BOARD_COUNT`.
    InvalidBoard,
    /// An enable line could not be driven.
    Line(ErrorKind),
}

/// Owned enable lines for all sensor boards.
///
/// Safe initial state: after [`init`](Self::init) every line sits at its
/// disabled level and no board is selected.
pub struct BoardEnables<EN> {
    lines: [EN; BOARDS],
    active_level: EnableLevel,
    enabled: Option<u8>,
}

impl<EN> BoardEnables<EN>
where
    EN: OutputPin,
{
    /// Takes ownership of the enable lines, indexed by board. No line is driven yet.
    pub fn new(lines: [EN; BOARDS], active_level: EnableLevel) -> Self {
        Self {
            lines,
            active_level,
            enabled: None,
        }
    }

    /// Drives every enable line to its disabled level.
    pub fn init(&mut self) -> core::result::Result<(), BoardError> {
        self.enabled = None;
        for board in 0..BOARDS {
            self.drive(board, false)?;
        }
        debug!("{} sensor boards held disabled", BOARDS);
        Ok(())
    }

    /// Enables `board`, disabling the previously enabled board first.
    pub fn enable(&mut self, board: u8) -> core::result::Result<(), BoardError> {
        if board >= BOARD_COUNT {
            return Err(BoardError::InvalidBoard);
        }

        if self.enabled == Some(board) {
            return Ok(());
        }

        self.disable_all()?;
        self.drive(usize::from(board), true)?;
        self.enabled = Some(board);
        trace!("board {} enabled", board);
        Ok(())
    }

    /// Disables the currently enabled board, if any.
    pub fn disable_all(&mut self) -> core::result::Result<(), BoardError> {
        if let Some(board) = self.enabled.take() {
            self.drive(usize::from(board), false)?;
        }
        Ok(())
    }

    /// Returns the board currently enabled.
    pub fn enabled(&self) -> Option<u8> {
        self.enabled
    }

    /// Consumes the structure and returns the owned lines.
    pub fn release(self) -> [EN; BOARDS] {
        self.lines
    }

    fn drive(&mut self, board: usize, enable: bool) -> core::result::Result<(), BoardError> {
        let high = match self.active_level {
            EnableLevel::ActiveHigh => enable,
            EnableLevel::ActiveLow => !enable,
        };

        let line = &mut self.lines[board];
        let result = if high { line.set_high() } else { line.set_low() };
        result.map_err(|err| BoardError::Line(err.kind()))
    }
}

impl<EN> ChannelSelector for BoardEnables<EN>
where
    EN: OutputPin,
{
    type Error = BoardError;

    /// Enables the channel's board. Multiplexer addressing is not driven here.
    fn select(&mut self, channel: ChannelAddress) -> core::result::Result<(), Self::Error> {
        self.enable(channel.board())
    }

    fn deselect(&mut self) -> core::result::Result<(), Self::Error> {
        self.disable_all()
    }
}
