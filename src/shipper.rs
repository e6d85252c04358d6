//! Public shipper type exported by the crate.

use std::{sync::Arc, thread, time::Duration};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::warn;
use parking_lot::Mutex;

use crate::{
    config::ShipperConfig,
    drop_warner::DropWarner,
    events::{EventSink, ShipperEvent},
    net::worker::{Command, spawn_worker},
    record,
    ring_buffer::RingBuffer,
};

/// Buffered, reconnecting shipper for a line-oriented log collector.
///
/// Each instance owns a ring buffer and a single worker thread that holds
/// the collector connection. [`log`](Shipper::log) never blocks and never
/// surfaces transport errors; failed deliveries are retried with fibonacci
/// backoff, and a full buffer evicts its oldest unread record.
pub struct Shipper {
    token: String,
    ring: Arc<Mutex<RingBuffer>>,
    tx: Option<Sender<Command>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    events: EventSink,
    event_rx: Receiver<ShipperEvent>,
    warner: DropWarner,
    close_timeout: Duration,
}

impl Shipper {
    /// Construct a shipper from a full configuration.
    ///
    /// Most callers go through
    /// [`ShipperBuilder`](crate::builder::ShipperBuilder), which validates
    /// the configuration first.
    pub fn with_config(config: ShipperConfig) -> Self {
        let ring = Arc::new(Mutex::new(RingBuffer::new(config.capacity)));
        let (events, event_rx) = EventSink::channel();
        let warner = DropWarner::new(config.warn_interval);
        let token = config.token.clone();
        // Shutdown may make one last connect attempt before the final
        // write, so the ack wait covers both timeouts.
        let close_timeout = config.connect_timeout.saturating_add(config.write_timeout);
        let (tx, handle) = spawn_worker(config, Arc::clone(&ring), events.clone());
        Self {
            token,
            ring,
            tx: Some(tx),
            handle: Mutex::new(Some(handle)),
            events,
            event_rx,
            warner,
            close_timeout,
        }
    }

    /// Accept one finalized payload.
    ///
    /// The payload is token-prefixed, its embedded newlines are rewritten
    /// to U+2028, and the resulting line is pushed into the ring buffer.
    /// The worker is woken only when the push did not evict anything; an
    /// eviction means a backlog already exists and a cycle is pending for
    /// it. Never blocks, whatever the connection state.
    pub fn log(&self, payload: &str) {
        let Some(tx) = self.tx.as_ref() else {
            self.warner.record_drop();
            self.warner.warn_if_due(|count| {
                warn!("shipper already closed, dropped {count} records");
            });
            return;
        };

        let line = record::finalize(&self.token, payload);
        if self.ring.lock().write(line) {
            let _ = tx.try_send(Command::Wake);
        } else {
            self.events.emit(ShipperEvent::BufferShift);
            self.warner.record_drop();
            self.warner.warn_if_due(|count| {
                warn!("ring buffer full, evicted {count} records since the last warning");
            });
        }
    }

    /// Drive a write cycle and wait until the worker acknowledges it, or
    /// `timeout` elapses. Returns `false` when the worker cannot be
    /// reached or does not acknowledge in time; records that still cannot
    /// be delivered stay buffered.
    pub fn flush(&self, timeout: Duration) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        self.warner.flush(|count| {
            warn!("ring buffer evicted {count} records in the last interval");
        });
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send_timeout(Command::Flush(ack_tx), timeout).is_err() {
            return false;
        }
        ack_rx.recv_timeout(timeout).is_ok()
    }

    /// Receiver for lifecycle notifications.
    ///
    /// Events are emitted non-blockingly and dropped when the channel is
    /// full, so observers can never stall the shipper. Cloned receivers
    /// share one stream of events; use a single observer.
    pub fn events(&self) -> Receiver<ShipperEvent> {
        self.event_rx.clone()
    }

    /// Number of records currently buffered.
    pub fn backlog(&self) -> usize {
        self.ring.lock().len()
    }

    /// Deliver whatever is still buffered (best effort, one connect
    /// attempt), tear the connection down, and wait for the worker to
    /// exit.
    pub fn close(&mut self) {
        self.request_shutdown();
        self.join_worker();
    }

    fn request_shutdown(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Command::Shutdown(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.recv_timeout(self.close_timeout);
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!("shipper worker thread panicked");
        }
    }
}

impl Drop for Shipper {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Shipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shipper")
            .field("backlog", &self.ring.lock().len())
            .field("closed", &self.tx.is_none())
            .finish()
    }
}
