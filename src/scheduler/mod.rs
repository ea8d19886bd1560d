//! Tick-driven scheduling of encoded transmissions
//!
//! An external fixed-rate timer (or the bundled [`Scheduler::run`] driver)
//! calls [`Scheduler::tick`] every 100 ms. Each tick recomputes the
//! synchronized time, refreshes the slot authorization on boundary
//! crossings and, while the station owns the current slot, drains the
//! message queue through the batch encoder into the transmission sink.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::core::{Codeword, Error, Message, Result, TIME_UNIT_MS};
use crate::protocol::{encoder, PREAMBLE_WORDS};
use crate::queue::MessageQueue;
use crate::time::{Slot, SlotTable, SyncedClock};

/// Destination for encoded codeword sequences, typically a channel into
/// the modulator task. Implementations must not block: `transmit` runs
/// inline on the periodic scheduling path.
pub trait TransmissionSink: Send {
    /// Hands one framed sequence to the radio side
    fn transmit(&mut self, codewords: Vec<Codeword>) -> Result<()>;
}

impl TransmissionSink for mpsc::UnboundedSender<Vec<Codeword>> {
    fn transmit(&mut self, codewords: Vec<Codeword>) -> Result<()> {
        self.send(codewords)
            .map_err(|_| Error::transmission("sink channel closed"))
    }
}

/// Scheduling states driven by the periodic tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No authorized slot, or nothing to send; the encoder is idle
    AwaitingSlot,
    /// An encoded sequence was handed to the sink this window
    DataEncoded,
    /// The window is still open and another encode pass may run before it closes
    SlotStillAllowed,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval of the periodic tick; one protocol time unit
    pub tick_interval: Duration,
    /// Deferrals tolerated before a message that keeps missing its window
    /// is rejected instead of requeued
    pub max_deliver_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            tick_interval: Duration::from_millis(TIME_UNIT_MS),
            max_deliver_attempts: 8,
        }
    }
}

type RefreshHandler = Box<dyn FnMut(&mut SlotTable) -> Result<()> + Send>;
type RejectionHandler = Box<dyn FnMut(Message) + Send>;

/// Drives the batch encoder from the slot cycle.
///
/// The scheduler owns the slot table and the synchronized clock, shares
/// the message queue with the producer side and pushes encoded sequences
/// into the transmission sink. It runs for the lifetime of the process;
/// no tick path panics or terminates the machine.
pub struct Scheduler {
    slots: SlotTable,
    queue: Arc<MessageQueue>,
    sink: Box<dyn TransmissionSink>,
    clock: Arc<SyncedClock>,
    state: SchedulerState,
    refresh_handler: Option<RefreshHandler>,
    rejection_handler: Option<RejectionHandler>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Creates a scheduler draining `queue` into `sink`
    pub fn new(queue: Arc<MessageQueue>, sink: impl TransmissionSink + 'static) -> Self {
        Self::with_config(queue, sink, SchedulerConfig::default())
    }

    /// Creates a scheduler with an explicit configuration
    pub fn with_config(
        queue: Arc<MessageQueue>,
        sink: impl TransmissionSink + 'static,
        config: SchedulerConfig,
    ) -> Self {
        Scheduler {
            slots: SlotTable::new(),
            queue,
            sink: Box::new(sink),
            clock: Arc::new(SyncedClock::new()),
            state: SchedulerState::AwaitingSlot,
            refresh_handler: None,
            rejection_handler: None,
            config,
        }
    }

    /// Registers the handler invoked with the slot table whenever the
    /// current slot changes. An error from the handler is logged and the
    /// tick continues with the previous authorization.
    pub fn set_refresh_handler(
        &mut self,
        handler: impl FnMut(&mut SlotTable) -> Result<()> + Send + 'static,
    ) {
        self.refresh_handler = Some(Box::new(handler));
    }

    /// Registers the handler receiving messages rejected after exhausting
    /// their delivery attempts
    pub fn set_rejection_handler(&mut self, handler: impl FnMut(Message) + Send + 'static) {
        self.rejection_handler = Some(Box::new(handler));
    }

    /// Replaces the authorized-slot set from a specification string
    pub fn configure_slots(&mut self, spec: &str) -> Result<()> {
        self.slots.configure(spec)
    }

    /// Returns the slot authorization table
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Shared clock handle for reading the synchronized time or applying
    /// corrections from other threads
    pub fn clock(&self) -> Arc<SyncedClock> {
        Arc::clone(&self.clock)
    }

    /// Current synchronized time (100 ms units)
    pub fn time(&self) -> u16 {
        self.clock.time()
    }

    /// Adds `delta` (100 ms units) to the time correction; takes effect
    /// with the next tick
    pub fn correct_time(&self, delta: i32) {
        self.clock.correct(delta);
    }

    /// Current scheduling state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Periodic tick entry point; samples the system clock
    pub fn tick(&mut self) {
        self.tick_at(SyncedClock::wall_units());
    }

    /// Tick against an externally supplied wall-clock reading (100 ms
    /// units since the epoch)
    pub fn tick_at(&mut self, wall_units: u64) {
        let time = self.clock.advance(wall_units);
        let slot = SlotTable::current_slot(time);

        if self.slots.crossed_boundary(slot) {
            debug!(%slot, time, "slot boundary crossed");
            if let Some(handler) = self.refresh_handler.as_mut() {
                if let Err(e) = handler(&mut self.slots) {
                    warn!(error = %e, "slot refresh handler failed");
                }
            }
        }

        let allowed = self.slots.is_allowed(slot);
        self.state = match self.state {
            SchedulerState::AwaitingSlot if allowed => {
                if self.encode_pass(slot) {
                    SchedulerState::DataEncoded
                } else {
                    SchedulerState::AwaitingSlot
                }
            }
            SchedulerState::DataEncoded if allowed => {
                if self.queue.is_empty() {
                    SchedulerState::DataEncoded
                } else {
                    SchedulerState::SlotStillAllowed
                }
            }
            SchedulerState::SlotStillAllowed if allowed => {
                if self.encode_pass(slot) {
                    SchedulerState::DataEncoded
                } else {
                    SchedulerState::SlotStillAllowed
                }
            }
            _ => SchedulerState::AwaitingSlot,
        };
    }

    /// Runs one encode pass over the current window and hands the result
    /// to the sink. Returns whether a sequence containing payload went out.
    fn encode_pass(&mut self, slot: Slot) -> bool {
        if self.queue.is_empty() {
            return false;
        }

        let slot_count = self.slots.slot_count(slot);
        let delay = self.clock.delay();

        let output = {
            let mut pending = self.queue.lock();
            encoder::encode(
                slot_count,
                delay,
                &mut pending,
                self.config.max_deliver_attempts,
            )
        };

        for message in output.rejected {
            error!(
                frame_pos = message.frame_pos(),
                words = message.words().len(),
                attempts = message.deferrals(),
                "rejecting undeliverable message"
            );
            if let Some(handler) = self.rejection_handler.as_mut() {
                handler(message);
            }
        }

        if output.codewords.len() <= PREAMBLE_WORDS {
            return false;
        }

        match self.sink.transmit(output.codewords) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "transmission sink failed");
                false
            }
        }
    }

    /// Drives the tick from a fixed-rate timer. Runs for the lifetime of
    /// the process; the caller owns start/stop by dropping the task.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
