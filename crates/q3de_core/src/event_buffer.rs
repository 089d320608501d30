use crate::DecodeError;
use alloc::vec::Vec;
use core::ops::Deref;
use q3de_common::DetectionEvent;
use tracing::warn;

/// A bounded, time-ordered buffer of events awaiting a decision.
///
/// Events are kept in admission order, which is non-decreasing time order,
/// so slot 0 always holds the oldest resident. Evicting a slot shifts the
/// younger entries down, as the hardware node buffer does.
pub struct EventBuffer {
    slots: Vec<DetectionEvent>,
    capacity: usize,
    floor_time: i64,
    newest_time: i64,
    horizon_time: i64,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            floor_time: 0,
            newest_time: 0,
            horizon_time: 0,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Time of the oldest resident event; the newest admitted time when empty.
    #[inline(always)]
    pub fn floor_time(&self) -> i64 {
        self.floor_time
    }

    /// Latest time up to which decisions may be finalized.
    #[inline(always)]
    pub fn horizon_time(&self) -> i64 {
        self.horizon_time
    }

    pub fn advance_horizon(&mut self) {
        self.horizon_time += 1;
    }

    /// Inserts `event` behind every resident event.
    ///
    /// Fails with [`DecodeError::BufferOverflow`] when all entries are taken.
    /// The caller guarantees non-decreasing event times.
    pub fn admit(&mut self, event: DetectionEvent) -> Result<(), DecodeError> {
        if self.is_full() {
            warn!(
                capacity = self.capacity,
                event = event.id.0,
                time = event.time(),
                "event buffer overflow"
            );
            return Err(DecodeError::BufferOverflow {
                capacity: self.capacity,
                event: event.id,
                time: event.time(),
            });
        }
        self.newest_time = event.time();
        if self.slots.is_empty() {
            self.floor_time = event.time();
        }
        self.slots.push(event);
        Ok(())
    }

    /// Removes the event in `slot`, keeping the rest in order.
    pub fn evict(&mut self, slot: usize) -> DetectionEvent {
        let event = self.slots.remove(slot);
        self.refresh_floor();
        event
    }

    /// Removes two distinct slots, returning the events in `(a, b)` order.
    pub fn evict_pair(&mut self, a: usize, b: usize) -> (DetectionEvent, DetectionEvent) {
        let (first, second) = if a > b {
            let ea = self.slots.remove(a);
            (ea, self.slots.remove(b))
        } else {
            let eb = self.slots.remove(b);
            (self.slots.remove(a), eb)
        };
        self.refresh_floor();
        (first, second)
    }

    /// Cycles between the floor and `arrival_time`.
    pub fn span(&self, arrival_time: i64) -> u64 {
        arrival_time.saturating_sub(self.floor_time).unsigned_abs()
    }

    fn refresh_floor(&mut self) {
        self.floor_time = self
            .slots
            .first()
            .map_or(self.newest_time, DetectionEvent::time);
    }
}

// Read-only slice access to the resident events.
impl Deref for EventBuffer {
    type Target = [DetectionEvent];
    fn deref(&self) -> &Self::Target {
        &self.slots
    }
}
