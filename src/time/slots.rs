use std::fmt;

use crate::core::{Error, Result};

/// Number of transmission slots in one cycle
pub const SLOT_COUNT: usize = 16;

/// Length of one slot in 100 ms units (6.4 s)
pub const SLOT_UNITS: u16 = 64;

/// Length of the full slot cycle in 100 ms units (102.4 s)
pub const CYCLE_UNITS: u16 = 1024;

/// One of the 16 transmission slots, named `0`-`F` in authorization specs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u8);

impl Slot {
    /// Creates a slot from its index, `None` if out of range
    pub fn new(index: u8) -> Option<Self> {
        if (index as usize) < SLOT_COUNT {
            Some(Slot(index))
        } else {
            None
        }
    }

    /// Slot index (0-15)
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Authorization table mapping the synchronized time to transmission
/// slots and tracking which slots this station may use.
///
/// A freshly created table authorizes nothing; the slot set arrives from
/// the master connection via [`SlotTable::configure`], usually inside the
/// refresh handler fired on each slot boundary.
#[derive(Debug, Default)]
pub struct SlotTable {
    allowed: [bool; SLOT_COUNT],
    last_seen: Option<Slot>,
}

impl SlotTable {
    /// Creates an empty table with no authorized slots
    pub fn new() -> Self {
        SlotTable::default()
    }

    /// Slot active at `time` (100 ms units)
    pub fn current_slot(time: u16) -> Slot {
        Slot(((time % CYCLE_UNITS) / SLOT_UNITS) as u8)
    }

    /// Replaces the authorized-slot set from a specification string: a
    /// sequence of hex digits naming the allowed slots, e.g. `"048C"`.
    /// Case-insensitive; whitespace is ignored; duplicates are harmless.
    pub fn configure(&mut self, spec: &str) -> Result<()> {
        let mut allowed = [false; SLOT_COUNT];
        for c in spec.chars() {
            if c.is_whitespace() {
                continue;
            }
            let index = c.to_digit(16).ok_or_else(|| {
                Error::invalid_slot_spec(format!("unexpected character '{}'", c))
            })?;
            allowed[index as usize] = true;
        }
        self.allowed = allowed;
        Ok(())
    }

    /// Whether transmission is authorized in `slot`
    pub fn is_allowed(&self, slot: Slot) -> bool {
        self.allowed[slot.index()]
    }

    /// Whether `slot` differs from the slot seen on the previous call,
    /// updating the observation. The first observation counts as a
    /// crossing so the authorization refresh runs on the first tick.
    pub fn crossed_boundary(&mut self, slot: Slot) -> bool {
        let crossed = self.last_seen != Some(slot);
        self.last_seen = Some(slot);
        crossed
    }

    /// Number of contiguous authorized slots starting at `from`, wrapping
    /// past slot `F`
    pub fn slot_count(&self, from: Slot) -> usize {
        let mut count = 0;
        while count < SLOT_COUNT && self.allowed[(from.index() + count) % SLOT_COUNT] {
            count += 1;
        }
        count
    }
}
