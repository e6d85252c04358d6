//! Lifecycle notifications emitted by the shipper.
//!
//! The drain/idle-timeout ordering is a correctness dependency inside the
//! worker; these events are the observer-facing copy of those transitions.
//! Sends never block: when no observer keeps up, events are dropped.

use crossbeam_channel::{Receiver, Sender, bounded};

/// Capacity of the event channel before drop-on-full kicks in.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Observable shipper lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShipperEvent {
    /// A connection to the collector was established.
    Connected,
    /// The active connection was torn down.
    Disconnected,
    /// The inactivity timeout fired on the active connection.
    TimedOut,
    /// The ring buffer emptied after a completed socket write.
    Drained,
    /// A full buffer evicted its oldest unread record. A backpressure
    /// indicator, not a backpressure mechanism.
    BufferShift,
}

/// Cloneable, non-blocking emitter shared by the shipper and its worker.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: Sender<ShipperEvent>,
}

impl EventSink {
    pub(crate) fn channel() -> (Self, Receiver<ShipperEvent>) {
        let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    pub(crate) fn emit(&self, event: ShipperEvent) {
        let _ = self.tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_never_blocks_when_full() {
        let (sink, rx) = EventSink::channel();
        for _ in 0..EVENT_CHANNEL_CAPACITY * 2 {
            sink.emit(ShipperEvent::BufferShift);
        }
        assert_eq!(rx.len(), EVENT_CHANNEL_CAPACITY);
    }

    #[test]
    fn delivers_events_in_order() {
        let (sink, rx) = EventSink::channel();
        sink.emit(ShipperEvent::Connected);
        sink.emit(ShipperEvent::Drained);
        assert_eq!(rx.try_recv(), Ok(ShipperEvent::Connected));
        assert_eq!(rx.try_recv(), Ok(ShipperEvent::Drained));
    }
}
