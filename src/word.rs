//! Layout of the 16-bit word exchanged with the ADC on every transaction.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

/// Number of significant bits in an ADC sample.
pub const SAMPLE_BITS: u32 = 12;
/// Mask selecting the sample bits of a received word.
pub const SAMPLE_MASK: u16 = (1 << SAMPLE_BITS) - 1;
/// Largest count the ADC can report.
pub const SAMPLE_MAX: u16 = SAMPLE_MASK;

/// Bitfield view of a transaction word.
///
/// Outbound, the header nibble carries a fixed pattern and the payload varies.
/// Inbound, the low twelve bits are the conversion result and the rest is
/// device fill that must not be interpreted.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    // Sample or payload bits (11:0).
    pub payload: B12,
    // Header nibble (15:12).
    pub header: B4,
}

impl Frame {
    /// Returns the 12-bit ADC count carried by a received frame.
    pub fn sample(self) -> u16 {
        self.payload()
    }
}

impl From<u16> for Frame {
    fn from(value: u16) -> Self {
        Self::from_bytes(value.to_le_bytes())
    }
}

impl From<Frame> for u16 {
    fn from(value: Frame) -> Self {
        u16::from_le_bytes(value.into_bytes())
    }
}

/// One raw word received from the ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawWord(pub u16);

impl RawWord {
    /// Returns the 12-bit sample with the device fill masked off.
    pub fn sample(self) -> u16 {
        Frame::from(self.0).sample()
    }

    /// Returns the word exactly as it was clocked in.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` when the sample sits on either rail.
    ///
    /// A missing or unpowered ADC reads back as all zeros or all ones, so a
    /// railed sample is worth flagging even though it may be genuine.
    pub fn is_railed(self) -> bool {
        let sample = self.sample();
        sample == 0 || sample == SAMPLE_MAX
    }
}

impl From<u16> for RawWord {
    fn from(value: u16) -> Self {
        Self(value)
    }
}
