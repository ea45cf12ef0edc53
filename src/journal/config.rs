//! Configuration consumed by [`JournalClient`](super::JournalClient).
//!
//! `JournalConfig` derives `Deserialize` so it can be embedded in an
//! application's configuration file; the connector is code-only and always
//! starts as [`UnixDatagramConnector`].

use std::{path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    buffer_pool::{DEFAULT_MAX_RETAINED, MIN_SEGMENT_SIZE},
    message_pool::DEFAULT_MAX_CACHED_MESSAGES,
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
};

use super::transport::{Connector, UnixDatagramConnector};

/// Well-known path of the journal's native protocol socket.
pub const DEFAULT_SOCKET_PATH: &str = "/run/systemd/journal/socket";
/// Default ceiling on the number of segments sent in one datagram.
pub const DEFAULT_MAX_SEGMENTS: usize = 20;
/// Upper bound accepted for `max_segments` (Linux `UIO_MAXIOV`).
pub const MAX_SEGMENTS_LIMIT: usize = 1024;

/// Errors raised by [`JournalConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid journal configuration: {0}")]
    InvalidConfig(String),
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Settings for a journal client.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Path of the datagram socket messages are sent to.
    pub socket_path: PathBuf,
    /// Value of the `SYSLOG_IDENTIFIER` field; `None` omits the field.
    pub syslog_identifier: Option<String>,
    /// Messages needing more segments than this are rejected with
    /// [`LogResult::Size`](crate::LogResult::Size).
    pub max_segments: usize,
    /// Smallest segment rented for message data.
    pub min_segment_size: usize,
    /// Idle segments kept by the buffer pool.
    pub max_retained_segments: usize,
    /// Idle messages kept by the message pool.
    pub max_cached_messages: usize,
    /// Minimum delay between repeated send-failure warnings.
    pub warn_interval: Duration,
    #[serde(skip, default = "default_connector")]
    pub connector: Arc<dyn Connector>,
}

fn default_connector() -> Arc<dyn Connector> {
    Arc::new(UnixDatagramConnector)
}

/// File name of the running program, used as the default identifier.
fn program_identifier() -> Option<String> {
    let arg0 = std::env::args_os().next()?;
    let name = std::path::Path::new(&arg0).file_name()?;
    Some(name.to_string_lossy().into_owned())
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            syslog_identifier: program_identifier(),
            max_segments: DEFAULT_MAX_SEGMENTS,
            min_segment_size: MIN_SEGMENT_SIZE,
            max_retained_segments: DEFAULT_MAX_RETAINED,
            max_cached_messages: DEFAULT_MAX_CACHED_MESSAGES,
            warn_interval: DEFAULT_WARN_INTERVAL,
            connector: default_connector(),
        }
    }
}

impl JournalConfig {
    /// Override the socket path.
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Override (or clear) the syslog identifier.
    pub fn with_syslog_identifier(mut self, identifier: Option<impl Into<String>>) -> Self {
        self.syslog_identifier = identifier.map(Into::into);
        self
    }

    /// Override the segment ceiling for a single send.
    pub fn with_max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments;
        self
    }

    /// Override the minimum segment size.
    pub fn with_min_segment_size(mut self, size: usize) -> Self {
        self.min_segment_size = size;
        self
    }

    /// Override the warning interval for send failures.
    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warn_interval = interval;
        self
    }

    /// Replace the socket connector.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Check the configuration for values the client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive!(self.max_segments, "max_segments")?;
        ensure_positive!(self.min_segment_size, "min_segment_size")?;
        if self.max_segments > MAX_SEGMENTS_LIMIT {
            return Err(ConfigError::InvalidConfig(format!(
                "max_segments must not exceed {MAX_SEGMENTS_LIMIT}"
            )));
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "socket_path must not be empty".into(),
            ));
        }
        if self.syslog_identifier.as_deref() == Some("") {
            return Err(ConfigError::InvalidConfig(
                "syslog_identifier must not be empty; use None to omit it".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_are_valid() {
        let config = JournalConfig::default();
        assert_eq!(config.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
        assert_eq!(config.max_segments, DEFAULT_MAX_SEGMENTS);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(JournalConfig::default().with_max_segments(0), "max_segments")]
    #[case(JournalConfig::default().with_max_segments(MAX_SEGMENTS_LIMIT + 1), "max_segments")]
    #[case(JournalConfig::default().with_min_segment_size(0), "min_segment_size")]
    #[case(JournalConfig::default().with_socket_path(""), "socket_path")]
    #[case(JournalConfig::default().with_syslog_identifier(Some("")), "syslog_identifier")]
    fn rejects_invalid_values(#[case] config: JournalConfig, #[case] field: &str) {
        let err = config.validate().expect_err("configuration must be rejected");
        assert!(matches!(err, ConfigError::InvalidConfig(msg) if msg.contains(field)));
    }

    #[rstest]
    fn deserializes_partial_config() {
        let config: JournalConfig = serde_json::from_str(
            r#"{"socket_path": "/tmp/journal.sock", "syslog_identifier": "svc", "max_segments": 8}"#,
        )
        .expect("config parses");
        assert_eq!(config.socket_path, PathBuf::from("/tmp/journal.sock"));
        assert_eq!(config.syslog_identifier.as_deref(), Some("svc"));
        assert_eq!(config.max_segments, 8);
        assert_eq!(config.min_segment_size, MIN_SEGMENT_SIZE);
    }

    #[rstest]
    fn identifier_can_be_cleared() {
        let config = JournalConfig::default().with_syslog_identifier(None::<String>);
        assert_eq!(config.syslog_identifier, None);
    }
}
