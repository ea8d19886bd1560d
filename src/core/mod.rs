//! Core types for the paging scheduler
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod types;

pub use self::error::{Error, Result};
pub use self::types::{Codeword, Message};

/// Number of 100 ms units in the wrapping transmitter clock (2^16)
pub const MAX_TIME: u32 = 65536;

/// Length of one scheduler time unit in milliseconds
pub const TIME_UNIT_MS: u64 = 100;
