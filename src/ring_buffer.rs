//! Fixed-capacity drop-oldest buffer for serialized records.
//!
//! Producers must never block, so a full buffer evicts its oldest unread
//! record to make room for the new one. Bounded memory is preferred over
//! completeness during a sustained outage, and oldest-first eviction keeps
//! the most recent history.

/// Circular store of finalized lines with drop-oldest overflow.
pub struct RingBuffer {
    slots: Vec<Option<String>>,
    read_at: usize,
    write_at: usize,
    len: usize,
}

impl RingBuffer {
    /// Create a buffer holding up to `capacity` records.
    ///
    /// `capacity` must be non-zero; the builder enforces this before a
    /// buffer is ever constructed.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            read_at: 0,
            write_at: 0,
            len: 0,
        }
    }

    /// Insert `item` at the write cursor. Returns `true` when the buffer
    /// had room and `false` when the oldest unread record was overwritten.
    /// The new item is always accepted.
    pub fn write(&mut self, item: String) -> bool {
        let clean = self.len < self.slots.len();
        if !clean {
            self.read_at = (self.read_at + 1) % self.slots.len();
            self.len -= 1;
        }
        self.slots[self.write_at] = Some(item);
        self.write_at = (self.write_at + 1) % self.slots.len();
        self.len += 1;
        clean
    }

    /// Remove and return the oldest unread record.
    pub fn read(&mut self) -> Option<String> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.read_at].take();
        self.read_at = (self.read_at + 1) % self.slots.len();
        self.len -= 1;
        item
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.slots.len())
            .field("len", &self.len)
            .finish()
    }
}
