//! Client for the journal's native datagram protocol.
//!
//! A [`JournalClient`] owns everything a process needs to talk to the journal:
//! the lazily connected socket, the buffer and message pools, and the
//! diagnostics warner. Sends are synchronous and run on the caller's thread.

mod config;
mod transport;


use std::{
    io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use log::{debug, warn};
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::{
    buffer_pool::BufferPool,
    field_name::FieldName,
    flags::{LogFlags, LogResult},
    message::JournalMessage,
    message_pool::{MessagePool, PoolKey, PooledMessage},
    rate_limited_warner::RateLimitedWarner,
    value::Value,
};

pub use config::{
    ConfigError, DEFAULT_MAX_SEGMENTS, DEFAULT_SOCKET_PATH, JournalConfig, MAX_SEGMENTS_LIMIT,
};
pub use transport::{Connector, DatagramSink, SendMode, UnixDatagramConnector};

use transport::{ConnectFailure, classify_connect_error, send_segments};

const STATE_UNKNOWN: u8 = 0;
const STATE_AVAILABLE: u8 = 1;
const STATE_ABSENT: u8 = 2;
const STATE_UNSUPPORTED: u8 = 3;

/// Reasons the journal socket could not be connected.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The platform cannot create unix datagram sockets.
    #[error("unix datagram sockets are not supported on this platform")]
    NotSupported,
    /// Nothing is listening on the configured path.
    #[error("journal socket {} is not available", path.display())]
    NotAvailable { path: PathBuf },
    /// Connecting failed for another reason.
    #[error("failed to connect to journal socket {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl JournalError {
    fn log_result(&self) -> LogResult {
        match self {
            Self::NotSupported => LogResult::NotSupported,
            Self::NotAvailable { .. } => LogResult::NotAvailable,
            Self::Connect { .. } => LogResult::UnknownError,
        }
    }
}

/// Sends structured records to the journal.
///
/// The socket is connected on first use. Concurrent first sends race on a
/// [`OnceCell`], so exactly one socket survives. A missing socket path is
/// retried on later sends; an unsupported platform is remembered.
#[derive(Debug)]
pub struct JournalClient {
    config: JournalConfig,
    messages: MessagePool,
    sink: OnceCell<Box<dyn DatagramSink>>,
    state: AtomicU8,
    warner: RateLimitedWarner,
}

impl JournalClient {
    /// Build a client from a validated configuration. No socket is opened.
    pub fn new(config: JournalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffers = Arc::new(BufferPool::new(
            config.max_retained_segments,
            config.min_segment_size,
        ));
        Ok(Self {
            messages: MessagePool::new(buffers, config.max_cached_messages),
            sink: OnceCell::new(),
            state: AtomicU8::new(STATE_UNKNOWN),
            warner: RateLimitedWarner::new(config.warn_interval),
            config,
        })
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn message_pool(&self) -> &MessagePool {
        &self.messages
    }

    /// Whether the journal looks reachable.
    ///
    /// The first call probes the socket path; the answer is cached until
    /// [`refresh_availability`](Self::refresh_availability) or a send that
    /// learns otherwise.
    pub fn is_available(&self) -> bool {
        if self.sink.get().is_some() {
            return true;
        }
        match self.state.load(Ordering::Acquire) {
            STATE_AVAILABLE => true,
            STATE_ABSENT | STATE_UNSUPPORTED => false,
            _ => {
                let available = cfg!(unix) && self.config.socket_path.exists();
                let state = match (cfg!(unix), available) {
                    (false, _) => STATE_UNSUPPORTED,
                    (true, true) => STATE_AVAILABLE,
                    (true, false) => STATE_ABSENT,
                };
                let _ = self.state.compare_exchange(
                    STATE_UNKNOWN,
                    state,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                available
            }
        }
    }

    /// Forget the cached availability so the next check probes again.
    ///
    /// An unsupported platform stays unsupported.
    pub fn refresh_availability(&self) {
        let _ = self.state.compare_exchange(
            STATE_ABSENT,
            STATE_UNKNOWN,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        let _ = self.state.compare_exchange(
            STATE_AVAILABLE,
            STATE_UNKNOWN,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// A pooled message for `key`, disabled when the journal is unavailable.
    pub fn message(&self, key: PoolKey) -> PooledMessage<'_> {
        self.messages.get(key, self.is_available())
    }

    /// A pooled message keyed by the calling thread.
    pub fn thread_message(&self) -> PooledMessage<'_> {
        self.message(PoolKey::current_thread())
    }

    /// Connect the socket now instead of on the first send.
    pub fn connect(&self) -> Result<(), JournalError> {
        self.sink().map(|_| ())
    }

    pub(crate) fn sink(&self) -> Result<&dyn DatagramSink, JournalError> {
        if self.state.load(Ordering::Acquire) == STATE_UNSUPPORTED {
            return Err(JournalError::NotSupported);
        }
        let path = &self.config.socket_path;
        let sink = self
            .sink
            .get_or_try_init(|| {
                debug!("connecting to journal socket {}", path.display());
                self.config.connector.connect(path)
            })
            .map_err(|err| match classify_connect_error(&err) {
                ConnectFailure::Unsupported => {
                    self.state.store(STATE_UNSUPPORTED, Ordering::Release);
                    JournalError::NotSupported
                }
                ConnectFailure::Absent => {
                    self.state.store(STATE_ABSENT, Ordering::Release);
                    JournalError::NotAvailable { path: path.clone() }
                }
                ConnectFailure::Fatal => JournalError::Connect {
                    path: path.clone(),
                    source: err,
                },
            })?;
        self.state.store(STATE_AVAILABLE, Ordering::Release);
        Ok(sink.as_ref())
    }

    /// Send `message` as one datagram.
    ///
    /// `PRIORITY` and `SYSLOG_IDENTIFIER` are appended according to `flags`
    /// and the configuration. The message is cleared before returning,
    /// whatever the outcome.
    pub fn send(&self, flags: LogFlags, message: &mut JournalMessage) -> LogResult {
        let result = self.send_inner(flags, message);
        message.clear();
        result
    }

    fn send_inner(&self, flags: LogFlags, message: &mut JournalMessage) -> LogResult {
        // A disabled message holds nothing; while the journal is known to be
        // missing, answer without touching the socket.
        if !message.is_enabled() && self.sink.get().is_none() {
            match self.state.load(Ordering::Acquire) {
                STATE_UNSUPPORTED => return LogResult::NotSupported,
                STATE_ABSENT => return LogResult::NotAvailable,
                _ => {}
            }
        }
        let sink = match self.sink() {
            Ok(sink) => sink,
            Err(err) => {
                if matches!(err, JournalError::Connect { .. }) {
                    self.report_failure(&err);
                }
                return err.log_result();
            }
        };
        if message.is_empty() {
            return LogResult::Success;
        }

        if let Some(priority) = flags.priority() {
            message.append(&FieldName::PRIORITY, priority.syslog_value());
        }
        if !flags.suppress_identifier() {
            if let Some(identifier) = self.config.syslog_identifier.as_deref() {
                message.append(&FieldName::SYSLOG_IDENTIFIER, identifier);
            }
        }

        let segments = message.wire_segments();
        if segments.len() > self.config.max_segments {
            warn!(
                "journal message dropped: {} segments exceed the limit of {}",
                segments.len(),
                self.config.max_segments
            );
            return LogResult::Size;
        }

        let mode = if flags.drop_when_busy() {
            SendMode::NonBlocking
        } else {
            SendMode::Blocking
        };
        match send_segments(sink, segments, mode) {
            Ok(_) => LogResult::Success,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock && flags.drop_when_busy() => {
                LogResult::Busy
            }
            Err(err) => {
                self.report_failure(&err);
                LogResult::UnknownError
            }
        }
    }

    fn report_failure(&self, err: &dyn std::error::Error) {
        self.warner.record_failure();
        self.warner.warn_if_due(|count| {
            warn!("journal send failed ({count} message(s) dropped): {err}");
        });
    }

    /// Emit a warning for any send failures still held back by rate limiting.
    pub fn flush_diagnostics(&self) {
        self.warner.flush(|count| {
            warn!("journal send failed ({count} message(s) dropped)");
        });
    }

    /// Build a message from `fields`, send it and return it to the pool.
    pub fn log(&self, flags: LogFlags, fields: &[(FieldName, Value<'_>)]) -> LogResult {
        let mut message = self.thread_message();
        for (name, value) in fields {
            message.append_value(name, value);
        }
        self.send(flags, &mut message)
    }
}
