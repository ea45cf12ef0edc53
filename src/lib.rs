//! Structured logging to the systemd journal over its native datagram
//! protocol.
//!
//! A record is built as a [`JournalMessage`] of `NAME`/value fields and sent
//! as one datagram by a [`JournalClient`]. Messages and their byte segments
//! are pooled so steady-state logging does not allocate. When the journal is
//! absent, pooled messages come back disabled and logging is a no-op.
//!
//! With the `log-compat` feature, [`JournalLogAdapter`] forwards records from
//! the `log` crate.

mod buffer_pool;
mod field_name;
mod flags;
mod journal;
#[cfg(feature = "log-compat")]
mod log_compat;
mod message;
mod message_pool;
mod priority;
mod rate_limited_warner;
mod value;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use buffer_pool::{BufferPool, DEFAULT_MAX_RETAINED, MIN_SEGMENT_SIZE};
pub use field_name::{
    FieldName, FieldNameError, MAX_FIELD_NAME_LEN, REPLACEMENT_CHAR, sanitize_into,
};
pub use flags::{LogFlags, LogResult};
pub use journal::{
    ConfigError, Connector, DEFAULT_MAX_SEGMENTS, DEFAULT_SOCKET_PATH, DatagramSink,
    JournalClient, JournalConfig, JournalError, MAX_SEGMENTS_LIMIT, SendMode,
    UnixDatagramConnector,
};
#[cfg(feature = "log-compat")]
pub use log_compat::{JournalLogAdapter, JournalLogOptions, install};
pub use message::{JournalMessage, Segment};
pub use message_pool::{DEFAULT_MAX_CACHED_MESSAGES, MessagePool, PoolKey, PooledMessage};
pub use priority::Priority;
pub use rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};
pub use value::{Scalar, Value};
