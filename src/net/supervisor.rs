//! Ownership and lifecycle of the single collector connection.

use std::io;
use std::time::Duration;

use log::debug;

use crate::config::BackoffPolicy;

use super::{
    backoff::BackoffState,
    transport::{self, ActiveConnection, Endpoint},
};

/// Owns at most one live connection plus the reconnect backoff state.
///
/// Only the worker thread calls into the supervisor, so an in-flight
/// connect attempt is never duplicated and the cached connection is never
/// observed from outside its accessor methods.
pub(crate) struct ConnectionSupervisor {
    endpoint: Endpoint,
    connect_timeout: Duration,
    write_timeout: Duration,
    backoff: BackoffState,
    conn: Option<ActiveConnection>,
}

impl ConnectionSupervisor {
    pub(crate) fn new(
        endpoint: Endpoint,
        connect_timeout: Duration,
        write_timeout: Duration,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            endpoint,
            connect_timeout,
            write_timeout,
            backoff: BackoffState::new(backoff),
            conn: None,
        }
    }

    pub(crate) fn established(&self) -> bool {
        self.conn.is_some()
    }

    /// Return the live connection, making a single connect attempt when
    /// none is cached. A successful attempt resets the backoff sequence;
    /// the caller schedules the retry after a failed one.
    pub(crate) fn acquire(&mut self) -> io::Result<&mut ActiveConnection> {
        if let Some(conn) = self.conn.take() {
            return Ok(self.conn.insert(conn));
        }

        let attempts = self.backoff.attempts();
        if attempts > 0 {
            debug!("retrying collector connection, failed attempts so far: {attempts}");
        } else {
            debug!("no connection exists, creating a new one");
        }
        let conn = transport::connect(&self.endpoint, self.connect_timeout)?;
        conn.set_write_timeout(Some(self.write_timeout))?;
        self.backoff.reset();
        Ok(self.conn.insert(conn))
    }

    /// Delay before the next connect attempt; advances the fibonacci
    /// sequence.
    pub(crate) fn retry_delay(&mut self) -> Duration {
        self.backoff.next_delay()
    }

    /// Drop the cached connection so the next [`acquire`] rebuilds from
    /// scratch. Returns whether a connection was actually open.
    ///
    /// [`acquire`]: ConnectionSupervisor::acquire
    pub(crate) fn teardown(&mut self) -> bool {
        self.conn.take().is_some()
    }
}
