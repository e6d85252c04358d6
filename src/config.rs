//! Configuration consumed by the shipper lifecycle.
//!
//! [`ShipperBuilder`](crate::builder::ShipperBuilder) constructs these
//! values before handing them to [`Shipper`](crate::shipper::Shipper) for
//! runtime use.

use std::time::Duration;

use crate::net::transport::{Endpoint, TlsOptions};

/// Default number of ring buffer slots.
pub const DEFAULT_BUFFER_CAPACITY: usize = 16192;
/// Default collector hostname.
pub const DEFAULT_HOST: &str = "data.logentries.com";
/// Default port when shipping over TLS.
pub const DEFAULT_SECURE_PORT: u16 = 443;
/// Default port when shipping over plaintext TCP.
pub const DEFAULT_PLAIN_PORT: u16 = 80;
/// Default socket inactivity window before the idle teardown logic runs.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(15);
/// Default timeout for establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
/// Default seed delay of the fibonacci reconnect sequence.
pub const DEFAULT_BACKOFF_INITIAL: Duration = Duration::from_secs(1);
/// Default cap on reconnect delays.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(15);
/// Default interval between aggregate eviction warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Full configuration for one [`Shipper`](crate::shipper::Shipper).
#[derive(Clone, Debug)]
pub struct ShipperConfig {
    /// Account token prefixed to every wire line.
    pub token: String,
    /// Ring buffer capacity in records.
    pub capacity: usize,
    /// Collector endpoint, including TLS options when secure.
    pub endpoint: Endpoint,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    /// `None` disables the idle-teardown machinery entirely.
    pub inactivity_timeout: Option<Duration>,
    pub backoff: BackoffPolicy,
    pub warn_interval: Duration,
}

impl ShipperConfig {
    /// Defaults: TLS to the default collector on port 443.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            capacity: DEFAULT_BUFFER_CAPACITY,
            endpoint: Endpoint {
                host: DEFAULT_HOST.to_owned(),
                port: DEFAULT_SECURE_PORT,
                tls: Some(TlsOptions {
                    domain: DEFAULT_HOST.to_owned(),
                    accept_invalid_certs: false,
                }),
            },
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            inactivity_timeout: Some(DEFAULT_INACTIVITY_TIMEOUT),
            backoff: BackoffPolicy::default(),
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

/// Fibonacci backoff policy for reconnection attempts.
///
/// Delays grow fibonacci-style from `initial` up to `max`, with no jitter
/// and no limit on the number of attempts.
#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_BACKOFF_INITIAL,
            max: DEFAULT_BACKOFF_MAX,
        }
    }
}
