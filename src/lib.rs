//! Buffered, reconnecting shipper for line-oriented log collectors.
//!
//! Records pushed via [`Shipper::log`] are finalized (token prefix,
//! embedded newlines rewritten to U+2028), buffered in a fixed-capacity
//! drop-oldest ring, and streamed over one persistent TCP or TLS
//! connection by a background worker. Producers never block and never see
//! transport errors: connection failures are retried forever with
//! fibonacci backoff, idle connections are torn down once the buffer has
//! drained, and a full buffer evicts its oldest unread record rather than
//! stalling the caller.
//!
//! ```no_run
//! use logship::{RecordStream, ShipperBuilder};
//! use serde_json::json;
//!
//! let shipper = ShipperBuilder::new("a1b2c3d4-e5f6-7890-abcd-ef1234567890")
//!     .build()
//!     .expect("valid configuration");
//! shipper.log("plain line");
//!
//! let stream = RecordStream::new(shipper).with_excluded_fields(["hostname"]);
//! let _ = stream.write(&json!({"level": 30, "msg": "structured"}));
//! ```
//!
//! Diagnostics go to the [`log`] facade (`debug!` for connection
//! lifecycle, `warn!` for drops and write failures); lifecycle
//! transitions are additionally observable via [`Shipper::events`].

pub mod builder;
pub mod config;
mod drop_warner;
pub mod events;
pub mod ingest;
pub mod level;
pub mod net;
pub mod record;
pub mod ring_buffer;
pub mod shipper;

pub use builder::{BuildError, ShipperBuilder};
pub use config::{BackoffPolicy, ShipperConfig};
pub use events::ShipperEvent;
pub use ingest::RecordStream;
pub use level::Severity;
pub use net::transport::{Endpoint, TlsOptions};
pub use ring_buffer::RingBuffer;
pub use shipper::Shipper;
