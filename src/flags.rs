//! Send flags and outcomes.

use std::{fmt, ops::BitOr};

use crate::priority::Priority;

/// Flags controlling how a message is sent.
///
/// The low four bits carry an optional [`Priority`]; the remaining bits are
/// independent modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LogFlags(u32);

const PRIORITY_MASK: u32 = 0xf;

impl LogFlags {
    /// No priority and no modifiers.
    pub const NONE: LogFlags = LogFlags(0);
    pub const EMERGENCY: LogFlags = LogFlags(Priority::Emergency as u32);
    pub const ALERT: LogFlags = LogFlags(Priority::Alert as u32);
    pub const CRITICAL: LogFlags = LogFlags(Priority::Critical as u32);
    pub const ERROR: LogFlags = LogFlags(Priority::Error as u32);
    pub const WARNING: LogFlags = LogFlags(Priority::Warning as u32);
    pub const NOTICE: LogFlags = LogFlags(Priority::Notice as u32);
    pub const INFORMATION: LogFlags = LogFlags(Priority::Information as u32);
    pub const DEBUG: LogFlags = LogFlags(Priority::Debug as u32);
    /// Drop the message instead of blocking when the socket buffer is full.
    pub const DROP_WHEN_BUSY: LogFlags = LogFlags(1 << 4);
    /// Do not append the `SYSLOG_IDENTIFIER` field.
    pub const DONT_APPEND_SYSLOG_IDENTIFIER: LogFlags = LogFlags(1 << 5);

    const ALL_MODIFIERS: u32 = Self::DROP_WHEN_BUSY.0 | Self::DONT_APPEND_SYSLOG_IDENTIFIER.0;

    /// Rebuild flags from raw bits, discarding unknown bits.
    pub fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & (PRIORITY_MASK | Self::ALL_MODIFIERS))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Priority carried by these flags, if any.
    pub fn priority(self) -> Option<Priority> {
        Priority::from_level((self.0 & PRIORITY_MASK) as u8)
    }

    /// Replace the priority bits.
    pub fn with_priority(self, priority: Priority) -> Self {
        Self((self.0 & !PRIORITY_MASK) | u32::from(priority.level()))
    }

    /// True when every modifier bit of `other` is set in `self`.
    pub fn contains(self, other: LogFlags) -> bool {
        let modifiers = other.0 & Self::ALL_MODIFIERS;
        self.0 & modifiers == modifiers
    }

    pub fn drop_when_busy(self) -> bool {
        self.contains(Self::DROP_WHEN_BUSY)
    }

    pub fn suppress_identifier(self) -> bool {
        self.contains(Self::DONT_APPEND_SYSLOG_IDENTIFIER)
    }
}

impl BitOr for LogFlags {
    type Output = LogFlags;

    /// Combine modifiers. When both sides carry a priority the right-hand
    /// one wins.
    fn bitor(self, rhs: Self) -> Self::Output {
        let priority = if rhs.0 & PRIORITY_MASK != 0 {
            rhs.0 & PRIORITY_MASK
        } else {
            self.0 & PRIORITY_MASK
        };
        LogFlags(((self.0 | rhs.0) & !PRIORITY_MASK) | priority)
    }
}

impl From<Priority> for LogFlags {
    fn from(priority: Priority) -> Self {
        LogFlags::NONE.with_priority(priority)
    }
}

/// Result of a send operation.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogResult {
    /// Message sent successfully.
    Success,
    /// Unexpected failure; a diagnostic was logged.
    UnknownError,
    /// The platform supports the journal but it is not reachable right now.
    NotAvailable,
    /// The platform cannot talk to the journal at all.
    NotSupported,
    /// The message needs more segments than a single send accepts.
    Size,
    /// Sending would have blocked and `DROP_WHEN_BUSY` was set.
    Busy,
}

impl LogResult {
    pub fn is_success(self) -> bool {
        self == LogResult::Success
    }
}

impl fmt::Display for LogResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogResult::Success => "success",
            LogResult::UnknownError => "unknown error",
            LogResult::NotAvailable => "journal not available",
            LogResult::NotSupported => "journal not supported",
            LogResult::Size => "message too large",
            LogResult::Busy => "journal busy",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn priority_and_modifiers_are_independent() {
        let flags = LogFlags::INFORMATION | LogFlags::DROP_WHEN_BUSY;
        assert_eq!(flags.priority(), Some(Priority::Information));
        assert!(flags.drop_when_busy());
        assert!(!flags.suppress_identifier());
    }

    #[rstest]
    fn none_has_no_priority() {
        assert_eq!(LogFlags::NONE.priority(), None);
        assert_eq!(LogFlags::DONT_APPEND_SYSLOG_IDENTIFIER.priority(), None);
    }

    #[rstest]
    fn right_hand_priority_wins() {
        let flags = LogFlags::DEBUG | LogFlags::ERROR;
        assert_eq!(flags.priority(), Some(Priority::Error));
        let flags = LogFlags::ERROR | LogFlags::DROP_WHEN_BUSY;
        assert_eq!(flags.priority(), Some(Priority::Error));
    }

    #[rstest]
    #[case(0x9)]
    #[case(0xf)]
    fn out_of_range_levels_carry_no_priority(#[case] bits: u32) {
        assert_eq!(LogFlags::from_bits_truncate(bits).priority(), None);
    }

    #[rstest]
    fn truncation_drops_unknown_bits() {
        let flags = LogFlags::from_bits_truncate(0xffff_fff7);
        assert_eq!(flags.bits(), 0x37);
    }

    #[rstest]
    fn with_priority_keeps_modifiers() {
        let flags = LogFlags::DROP_WHEN_BUSY.with_priority(Priority::Notice);
        assert_eq!(flags.priority(), Some(Priority::Notice));
        assert!(flags.drop_when_busy());
    }
}
