//! Builder producing a [`Shipper`] from validated configuration.

use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::{
    config::{
        BackoffPolicy, DEFAULT_BACKOFF_INITIAL, DEFAULT_BACKOFF_MAX, DEFAULT_BUFFER_CAPACITY,
        DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_PLAIN_PORT,
        DEFAULT_SECURE_PORT, DEFAULT_WARN_INTERVAL, DEFAULT_WRITE_TIMEOUT, ShipperConfig,
    },
    net::transport::{Endpoint, TlsOptions},
    record,
    shipper::Shipper,
};

/// Errors that may occur while building a shipper.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid shipper configuration: {0}")]
    InvalidConfig(String),
}

/// Builder for [`Shipper`] instances.
///
/// Defaults target the standard collector endpoint over TLS. The token is
/// deliberately not validated; a malformed token produces malformed
/// output, nothing more.
#[derive(Clone, Debug)]
pub struct ShipperBuilder {
    token: String,
    host: String,
    port: Option<u16>,
    secure: bool,
    accept_invalid_certs: bool,
    capacity: usize,
    inactivity_timeout: Option<Duration>,
    backoff: BackoffPolicy,
    connect_timeout: Duration,
    write_timeout: Duration,
    warn_interval: Duration,
}

impl ShipperBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            host: DEFAULT_HOST.to_owned(),
            port: None,
            secure: true,
            accept_invalid_certs: false,
            capacity: DEFAULT_BUFFER_CAPACITY,
            inactivity_timeout: Some(DEFAULT_INACTIVITY_TIMEOUT),
            backoff: BackoffPolicy {
                initial: DEFAULT_BACKOFF_INITIAL,
                max: DEFAULT_BACKOFF_MAX,
            },
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Override the port. Otherwise 443 is used over TLS and 80 over
    /// plaintext.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Ship over plaintext TCP instead of TLS.
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    /// Skip certificate validation (intended for tests).
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    /// Override the ring buffer capacity in records.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = Some(timeout);
        self
    }

    /// Keep idle connections open indefinitely.
    pub fn disable_inactivity_timeout(mut self) -> Self {
        self.inactivity_timeout = None;
        self
    }

    /// Override the fibonacci backoff seed and cap.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = BackoffPolicy { initial, max };
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Override how often aggregate eviction warnings are logged.
    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warn_interval = interval;
        self
    }

    /// Validate the configuration and spawn the shipper.
    pub fn build(self) -> Result<Shipper, BuildError> {
        if self.capacity == 0 {
            return Err(BuildError::InvalidConfig(
                "buffer capacity must be greater than zero".into(),
            ));
        }
        if self.backoff.initial.is_zero() {
            return Err(BuildError::InvalidConfig(
                "initial backoff delay must be greater than zero".into(),
            ));
        }
        if self.backoff.max < self.backoff.initial {
            return Err(BuildError::InvalidConfig(
                "maximum backoff delay must not be below the initial delay".into(),
            ));
        }
        if self.accept_invalid_certs && !self.secure {
            return Err(BuildError::InvalidConfig(
                "certificate options require a secure transport".into(),
            ));
        }
        if !record::looks_like_token(&self.token) {
            debug!("token does not match the expected 8-4-4-4-12 hex shape, shipping it anyway");
        }

        let port = self.port.unwrap_or(if self.secure {
            DEFAULT_SECURE_PORT
        } else {
            DEFAULT_PLAIN_PORT
        });
        let tls = self.secure.then(|| TlsOptions {
            domain: self.host.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        });
        let endpoint = Endpoint {
            host: self.host,
            port,
            tls,
        };

        Ok(Shipper::with_config(ShipperConfig {
            token: self.token,
            capacity: self.capacity,
            endpoint,
            connect_timeout: self.connect_timeout,
            write_timeout: self.write_timeout,
            inactivity_timeout: self.inactivity_timeout,
            backoff: self.backoff,
            warn_interval: self.warn_interval,
        }))
    }
}
