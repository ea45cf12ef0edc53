//! Syslog severities understood by the journal.

/// Message priority.
///
/// Discriminants match the priority bits of [`LogFlags`](crate::LogFlags);
/// the value written to the `PRIORITY` field is the discriminant minus one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    /// System is unusable.
    Emergency = 1,
    /// Action must be taken immediately.
    Alert = 2,
    /// Critical conditions.
    Critical = 3,
    /// Error conditions.
    Error = 4,
    /// Warning conditions.
    Warning = 5,
    /// Normal but significant conditions.
    Notice = 6,
    /// Informational.
    #[default]
    Information = 7,
    /// Debug-level messages.
    Debug = 8,
}

impl Priority {
    /// Decode the low priority bits of a flag set. Zero means "no priority".
    pub fn from_level(level: u8) -> Option<Self> {
        Some(match level {
            1 => Self::Emergency,
            2 => Self::Alert,
            3 => Self::Critical,
            4 => Self::Error,
            5 => Self::Warning,
            6 => Self::Notice,
            7 => Self::Information,
            8 => Self::Debug,
            _ => return None,
        })
    }

    /// The flag-level encoding (1..=8).
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Value sent in the `PRIORITY` field (0 is the most urgent).
    pub fn syslog_value(self) -> u8 {
        self.level() - 1
    }
}

impl From<log::Level> for Priority {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Priority::Error,
            log::Level::Warn => Priority::Warning,
            log::Level::Info => Priority::Information,
            log::Level::Debug | log::Level::Trace => Priority::Debug,
        }
    }
}
