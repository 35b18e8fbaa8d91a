#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

mod error;

pub mod acquisition;
pub mod board;
pub mod channel;
pub mod config;
pub mod console;
pub mod interface;
pub mod word;

#[cfg(test)]
mod testing;

pub use crate::acquisition::Acquisition;
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::interface::Exchange;
