//! Worker thread driving the write cycle, drain tracking, and reconnects.
//!
//! All transfers from the ring buffer to the socket happen on this one
//! thread, so at most one record is in flight at any time and the drain
//! and idle-timeout transitions cannot race each other. The channel wait
//! doubles as both the backoff retry timer and the inactivity watcher.

use std::{
    io,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::{
    config::ShipperConfig,
    events::{EventSink, ShipperEvent},
    ring_buffer::RingBuffer,
};

use super::supervisor::ConnectionSupervisor;

/// Commands processed by the worker thread.
#[derive(Debug)]
pub(crate) enum Command {
    /// A record was accepted into the ring buffer.
    Wake,
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

/// Capacity of the command channel. Wakes coalesce (one cycle drains the
/// whole buffer), so a small bound suffices.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

pub(crate) fn spawn_worker(
    config: ShipperConfig,
    ring: Arc<Mutex<RingBuffer>>,
    events: EventSink,
) -> (Sender<Command>, thread::JoinHandle<()>) {
    let (tx, rx) = bounded(COMMAND_CHANNEL_CAPACITY);
    let handle = thread::spawn(move || Worker::new(config, ring, events, rx).run());
    (tx, handle)
}

/// Drain/idle-timeout state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DrainState {
    /// Records are flowing or pending.
    Active,
    /// The buffer emptied after a completed socket write and nothing has
    /// been pushed since.
    Drained,
    /// The idle timeout fired before the buffer drained; teardown is
    /// deferred until the next drain signal.
    AwaitingDrain,
}

enum CycleOutcome {
    /// Nothing to transfer; the buffer was already empty.
    Idle,
    /// The buffer emptied after at least one completed write.
    Drained,
    Failed(io::Error),
}

struct Worker {
    rx: Receiver<Command>,
    ring: Arc<Mutex<RingBuffer>>,
    events: EventSink,
    supervisor: ConnectionSupervisor,
    inactivity_timeout: Option<Duration>,
    drain: DrainState,
    retry_at: Option<Instant>,
    idle_deadline: Option<Instant>,
}

impl Worker {
    fn new(
        config: ShipperConfig,
        ring: Arc<Mutex<RingBuffer>>,
        events: EventSink,
        rx: Receiver<Command>,
    ) -> Self {
        let supervisor = ConnectionSupervisor::new(
            config.endpoint,
            config.connect_timeout,
            config.write_timeout,
            config.backoff,
        );
        Self {
            rx,
            ring,
            events,
            supervisor,
            inactivity_timeout: config.inactivity_timeout,
            drain: DrainState::Active,
            retry_at: None,
            idle_deadline: None,
        }
    }

    fn run(mut self) {
        loop {
            let received = match self.next_deadline() {
                Some(deadline) => match self.rx.recv_deadline(deadline) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => {
                        self.on_timer();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                },
                None => self.rx.recv().ok(),
            };

            match received {
                Some(Command::Wake) => self.write_cycle(),
                Some(Command::Flush(ack)) => {
                    // Nothing buffered and no connection: acknowledge
                    // without dialing.
                    if !self.ring.lock().is_empty() || self.supervisor.established() {
                        self.write_cycle();
                    }
                    let _ = ack.send(());
                }
                Some(Command::Shutdown(ack)) => {
                    self.final_drain();
                    let _ = ack.send(());
                    break;
                }
                // Producer side dropped without an explicit shutdown.
                None => {
                    self.final_drain();
                    break;
                }
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.retry_at, self.idle_deadline) {
            (Some(retry), Some(idle)) => Some(retry.min(idle)),
            (Some(retry), None) => Some(retry),
            (None, Some(idle)) => Some(idle),
            (None, None) => None,
        }
    }

    fn on_timer(&mut self) {
        let now = Instant::now();
        if let Some(at) = self.retry_at
            && now >= at
        {
            self.retry_at = None;
            self.write_cycle();
        }
        if let Some(at) = self.idle_deadline
            && Instant::now() >= at
        {
            self.idle_deadline = None;
            self.on_idle_timeout();
        }
    }

    /// One write cycle: clear the drain flag, obtain a connection, and
    /// transfer buffered records until the buffer empties or the
    /// connection fails. A cycle never propagates an error; failures are
    /// logged and retried on the backoff timer.
    fn write_cycle(&mut self) {
        // The drain flag clears at the start of a cycle with pending
        // records; a cycle over an already-empty buffer must leave a
        // standing `Drained` intact or the idle teardown would wait on a
        // drain signal that never comes.
        if self.drain == DrainState::Drained && !self.ring.lock().is_empty() {
            self.drain = DrainState::Active;
        }

        let newly_connected = !self.supervisor.established();
        let conn = match self.supervisor.acquire() {
            Ok(conn) => conn,
            Err(err) => {
                debug!("failed to obtain a collector connection: {err}");
                self.schedule_retry();
                return;
            }
        };
        if newly_connected {
            self.events.emit(ShipperEvent::Connected);
        }

        let mut wrote = false;
        let outcome = loop {
            let record = self.ring.lock().read();
            let Some(record) = record else {
                if !wrote {
                    break CycleOutcome::Idle;
                }
                break match conn.flush() {
                    Ok(()) => CycleOutcome::Drained,
                    Err(err) => CycleOutcome::Failed(err),
                };
            };
            if let Err(err) = conn.write_all(record.as_bytes()) {
                // The dequeued record is lost; re-queuing it would reorder
                // it behind records accepted later.
                break CycleOutcome::Failed(err);
            }
            wrote = true;
        };

        match outcome {
            CycleOutcome::Idle => {}
            CycleOutcome::Drained => self.on_drained(),
            CycleOutcome::Failed(err) => {
                warn!("record transfer failed: {err}");
                self.disconnect();
                self.schedule_retry();
            }
        }

        if self.supervisor.established() {
            self.touch_activity();
        }
    }

    /// The buffer reached empty after a completed socket write.
    fn on_drained(&mut self) {
        let deferred = self.drain == DrainState::AwaitingDrain;
        self.drain = DrainState::Drained;
        self.events.emit(ShipperEvent::Drained);
        if deferred {
            debug!("buffer drained after a deferred inactivity timeout, destroying the connection");
            self.disconnect();
        } else {
            debug!("ring buffer drained");
        }
    }

    fn on_idle_timeout(&mut self) {
        if !self.supervisor.established() {
            return;
        }
        self.events.emit(ShipperEvent::TimedOut);
        match self.drain {
            DrainState::Drained => {
                debug!("socket inactive with a drained buffer, destroying the connection");
                self.disconnect();
            }
            DrainState::Active | DrainState::AwaitingDrain => {
                debug!("inactivity timeout fired but the buffer is not drained, deferring teardown");
                self.drain = DrainState::AwaitingDrain;
            }
        }
    }

    fn disconnect(&mut self) {
        if self.supervisor.teardown() {
            self.idle_deadline = None;
            self.events.emit(ShipperEvent::Disconnected);
            debug!("collector connection closed");
        }
    }

    /// Arm the worker-side retry timer while undelivered records remain.
    /// Without it a backlog built up during an outage would only retry
    /// when fresh `log()` traffic arrives.
    fn schedule_retry(&mut self) {
        if self.ring.lock().is_empty() {
            return;
        }
        let delay = self.supervisor.retry_delay();
        debug!("next connection attempt in {}ms", delay.as_millis());
        self.retry_at = Some(Instant::now() + delay);
    }

    fn touch_activity(&mut self) {
        self.idle_deadline = self.inactivity_timeout.map(|timeout| Instant::now() + timeout);
    }

    /// Best-effort delivery of whatever is still buffered, then teardown.
    /// Makes at most one connect attempt; shutdown never waits on the
    /// backoff timer.
    fn final_drain(&mut self) {
        if !self.ring.lock().is_empty() {
            self.write_cycle();
        }
        self.disconnect();
    }
}
