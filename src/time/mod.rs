//! Time and slot tracking
//!
//! The transmitter shares a 102.4 s cycle of 16 slots with the rest of
//! the network. This module keeps the wrapping 100 ms clock aligned with
//! that cycle and maps it to the slots the station is authorized to use.

pub mod clock;
pub mod slots;

pub use self::clock::SyncedClock;
pub use self::slots::{Slot, SlotTable};
