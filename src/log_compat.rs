//! Compatibility bridge for the Rust `log` crate.
//!
//! [`JournalLogAdapter`] implements `log::Log` and turns each record into a
//! journal message: the formatted text goes to `MESSAGE`, the target to
//! `LOGGER`, the source location to `CODE_FILE`/`CODE_LINE`, and structured
//! key-value pairs to sanitized field names.

use std::sync::Arc;

use log::{
    LevelFilter, Metadata, Record, SetLoggerError,
    kv::{self, VisitSource},
};

use crate::{
    field_name::FieldName,
    flags::LogFlags,
    journal::JournalClient,
    message::JournalMessage,
    message_pool::PoolKey,
    priority::Priority,
    value::Value,
};

/// Targets emitted by this crate; forwarding them could recurse through a
/// failing send.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Options for [`JournalLogAdapter`].
#[derive(Clone, Copy, Debug)]
pub struct JournalLogOptions {
    /// Most verbose level forwarded.
    pub level: LevelFilter,
    /// Drop records instead of blocking when the socket buffer is full.
    pub drop_when_busy: bool,
}

impl Default for JournalLogOptions {
    fn default() -> Self {
        Self {
            level: LevelFilter::Trace,
            drop_when_busy: false,
        }
    }
}

impl JournalLogOptions {
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_drop_when_busy(mut self, drop_when_busy: bool) -> Self {
        self.drop_when_busy = drop_when_busy;
        self
    }
}

/// Adapter implementing the Rust `log::Log` trait on top of a
/// [`JournalClient`].
#[derive(Debug)]
pub struct JournalLogAdapter {
    client: Arc<JournalClient>,
    options: JournalLogOptions,
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

struct FieldVisitor<'m> {
    message: &'m mut JournalMessage,
}

impl<'kvs> VisitSource<'kvs> for FieldVisitor<'_> {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.message
            .append_sanitized(key.as_str(), Value::Display(&value));
        Ok(())
    }
}

impl JournalLogAdapter {
    pub fn new(client: Arc<JournalClient>, options: JournalLogOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &Arc<JournalClient> {
        &self.client
    }

    fn flags_for(&self, level: log::Level) -> LogFlags {
        let flags = LogFlags::from(Priority::from(level));
        if self.options.drop_when_busy {
            flags | LogFlags::DROP_WHEN_BUSY
        } else {
            flags
        }
    }
}

impl log::Log for JournalLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.options.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) || is_own_target(record.target()) {
            return;
        }
        if record.args().as_str() == Some("") {
            return;
        }

        let mut message = self.client.message(PoolKey::current_thread());
        if !message.is_enabled() {
            return;
        }
        message.append(&FieldName::MESSAGE, Value::Display(record.args()));
        message.append(&FieldName::LOGGER, record.target());
        message.append(&FieldName::CODE_FILE, record.file());
        message.append(&FieldName::CODE_LINE, record.line());

        let mut visitor = FieldVisitor {
            message: &mut *message,
        };
        // The visitor never fails.
        let _ = record.key_values().visit(&mut visitor);

        let _ = self.client.send(self.flags_for(record.level()), &mut message);
    }

    fn flush(&self) {
        self.client.flush_diagnostics();
    }
}

/// Install `adapter` as the global Rust logger and raise the global max level
/// to the adapter's level.
///
/// Fails when another global logger is already set.
pub fn install(adapter: JournalLogAdapter) -> Result<(), SetLoggerError> {
    let level = adapter.options.level;
    log::set_boxed_logger(Box::new(adapter))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for the `log` crate bridge.

    use super::*;
    use crate::{
        journal::{Connector, JournalConfig},
        test_utils::{CollectingConnector, decode_fields_map},
    };
    use log::Log;
    use rstest::{fixture, rstest};

    struct Harness {
        connector: Arc<CollectingConnector>,
        adapter: JournalLogAdapter,
    }

    fn harness_with(options: JournalLogOptions) -> Harness {
        log::set_max_level(LevelFilter::Trace);
        let connector = Arc::new(CollectingConnector::new());
        let dyn_connector: Arc<dyn Connector> = connector.clone();
        let client = JournalClient::new(
            JournalConfig::default()
                .with_syslog_identifier(Some("bridge"))
                .with_connector(dyn_connector),
        )
        .expect("valid configuration");
        client.connect().expect("connects");
        Harness {
            connector,
            adapter: JournalLogAdapter::new(Arc::new(client), options),
        }
    }

    #[fixture]
    fn harness() -> Harness {
        harness_with(JournalLogOptions::default())
    }

    #[rstest]
    fn forwards_record_fields(harness: Harness) {
        let kvs: &[(&str, i64)] = &[("user.id", 42)];
        let record = Record::builder()
            .args(format_args!("hello journal"))
            .level(log::Level::Warn)
            .target("bridge::test")
            .file(Some("lib.rs"))
            .line(Some(42))
            .key_values(&kvs)
            .build();
        harness.adapter.log(&record);

        let sent = harness.connector.sink().datagrams();
        assert_eq!(sent.len(), 1);
        let fields = decode_fields_map(&sent[0].bytes);
        assert_eq!(fields["MESSAGE"], "hello journal");
        assert_eq!(fields["LOGGER"], "bridge::test");
        assert_eq!(fields["CODE_FILE"], "lib.rs");
        assert_eq!(fields["CODE_LINE"], "42");
        assert_eq!(fields["USERXID"], "42");
        assert_eq!(fields["PRIORITY"], "4");
        assert_eq!(fields["SYSLOG_IDENTIFIER"], "bridge");
    }

    #[rstest]
    fn missing_location_is_omitted(harness: Harness) {
        let record = Record::builder()
            .args(format_args!("no location"))
            .level(log::Level::Trace)
            .target("bridge")
            .build();
        harness.adapter.log(&record);

        let fields = decode_fields_map(&harness.connector.sink().datagrams()[0].bytes);
        assert!(!fields.contains_key("CODE_FILE"));
        assert!(!fields.contains_key("CODE_LINE"));
        assert_eq!(fields["PRIORITY"], "7");
    }

    #[rstest]
    fn empty_messages_are_skipped(harness: Harness) {
        let record = Record::builder()
            .args(format_args!(""))
            .level(log::Level::Info)
            .target("bridge")
            .build();
        harness.adapter.log(&record);
        assert!(harness.connector.sink().datagrams().is_empty());
    }

    #[rstest]
    #[case("femtojournal")]
    #[case("femtojournal::journal")]
    fn own_targets_are_skipped(harness: Harness, #[case] target: &str) {
        let record = Record::builder()
            .args(format_args!("internal"))
            .level(log::Level::Warn)
            .target(target)
            .build();
        harness.adapter.log(&record);
        assert!(harness.connector.sink().datagrams().is_empty());
    }

    #[rstest]
    fn similar_targets_are_forwarded() {
        assert!(!is_own_target("femtojournalist"));
        assert!(is_own_target("femtojournal::message"));
    }

    #[rstest]
    fn respects_level_filter() {
        let harness = harness_with(JournalLogOptions::default().with_level(LevelFilter::Warn));
        harness.adapter.log(
            &Record::builder()
                .args(format_args!("info"))
                .level(log::Level::Info)
                .target("bridge")
                .build(),
        );
        harness.adapter.log(
            &Record::builder()
                .args(format_args!("error"))
                .level(log::Level::Error)
                .target("bridge")
                .build(),
        );
        let sent = harness.connector.sink().datagrams();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_fields_map(&sent[0].bytes)["MESSAGE"], "error");
    }

    #[rstest]
    fn drop_when_busy_uses_non_blocking_sends() {
        let harness = harness_with(JournalLogOptions::default().with_drop_when_busy(true));
        let record = Record::builder()
            .args(format_args!("fast"))
            .level(log::Level::Info)
            .target("bridge")
            .build();
        harness.adapter.log(&record);
        assert_eq!(
            harness.connector.sink().datagrams()[0].mode,
            crate::journal::SendMode::NonBlocking
        );
    }
}
