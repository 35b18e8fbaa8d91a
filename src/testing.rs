//! Test doubles shared by the unit tests.

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{self, ErrorType, SpiBus};

use crate::error::{Error, Result};
use crate::interface::Exchange;

/// Delay that records every requested wait in nanoseconds instead of sleeping.
#[derive(Debug, Default, Clone)]
pub struct RecordingDelay {
    calls: Rc<RefCell<Vec<u64>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.borrow().clone()
    }

    pub fn total_ns(&self) -> u64 {
        self.calls.borrow().iter().sum()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.borrow_mut().push(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.calls.borrow_mut().push(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.borrow_mut().push(u64::from(ms) * 1_000_000);
    }
}

/// Bus error reported by [`FailingBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl spi::Error for BusFault {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// SPI bus whose every transfer fails.
pub struct FailingBus;

impl ErrorType for FailingBus {
    type Error = BusFault;
}

impl SpiBus<u8> for FailingBus {
    fn read(&mut self, _words: &mut [u8]) -> core::result::Result<(), Self::Error> {
        Err(BusFault)
    }

    fn write(&mut self, _words: &[u8]) -> core::result::Result<(), Self::Error> {
        Err(BusFault)
    }

    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> core::result::Result<(), Self::Error> {
        Err(BusFault)
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> core::result::Result<(), Self::Error> {
        Err(BusFault)
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Engine double that records outbound words and replays programmed replies.
///
/// Without programmed replies it loops the outbound word back.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub sent: Vec<u16>,
    replies: VecDeque<core::result::Result<u16, BusFault>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: &[core::result::Result<u16, BusFault>]) -> Self {
        Self {
            sent: Vec::new(),
            replies: replies.iter().copied().collect(),
        }
    }
}

impl Exchange for RecordingEngine {
    type Error = BusFault;

    fn exchange(&mut self, word: u16) -> Result<u16, Self::Error> {
        self.sent.push(word);
        match self.replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(err)) => Err(Error::Interface(err)),
            None => Ok(word),
        }
    }
}

/// Operator console fed from a byte slice, capturing everything written.
#[derive(Debug, Default)]
pub struct TestConsole {
    input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl TestConsole {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.bytes().collect(),
            output: Vec::new(),
        }
    }

    pub fn output_str(&self) -> &str {
        core::str::from_utf8(&self.output).unwrap()
    }
}

impl embedded_io::ErrorType for TestConsole {
    type Error = Infallible;
}

impl embedded_io::Read for TestConsole {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl embedded_io::Write for TestConsole {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}
