//! POCSAG framing constants and the batch encoder
//!
//! Values in this module are fixed by the POCSAG protocol and are not
//! tunable: a transmission opens with 18 preamble words, then repeats
//! batches of one sync word plus 16 data words (8 frames of 2 words) at
//! 1200 bit/s.

pub mod encoder;

pub use self::encoder::{encode, max_batches, EncodeOutput};

use crate::core::Codeword;

/// Preamble codeword, the alternating bit pattern sent ahead of the first batch
pub const PREAMBLE: Codeword = 0xAAAA_AAAA;

/// Frame synchronisation codeword opening every batch
pub const SYNC: Codeword = 0x7CD2_15D8;

/// Idle codeword filling unused frame halves
pub const IDLE: Codeword = 0x7A89_C197;

/// Number of preamble words sent ahead of the first batch
pub const PREAMBLE_WORDS: usize = 18;

/// Words per batch: one sync word plus 16 data words
pub const WORDS_PER_BATCH: usize = 17;

/// Data words per batch
pub const DATA_WORDS_PER_BATCH: usize = 16;

/// Frames per batch, two data words each
pub const FRAMES_PER_BATCH: usize = 8;

/// POCSAG signalling rate in bits per second
pub const BIT_RATE: u32 = 1200;

/// Bits per batch: 17 words of 32 bits
pub const BITS_PER_BATCH: u32 = 544;
