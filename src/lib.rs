//! POCSAG time-slot scheduling and batch encoding for paging transmitters
//!
//! This library turns a queue of pre-encoded pages into framed POCSAG
//! codeword sequences sized to the transmission windows currently
//! authorized for the station. A wrapping 100 ms clock is tracked against
//! the shared 16-slot cycle; a periodic tick decides when transmission is
//! permitted and hands encoded sequences to the radio side.

pub mod core;
pub mod protocol;
pub mod queue;
pub mod scheduler;
pub mod time;

// Re-export commonly used items
pub use crate::core::{Codeword, Error, Message, Result};
pub use crate::queue::MessageQueue;
pub use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerState, TransmissionSink};
pub use crate::time::{Slot, SlotTable, SyncedClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
