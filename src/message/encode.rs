//! Low-level writers for [`JournalMessage`].

use std::fmt::{self, Write as _};

use crate::value::Value;

use super::JournalMessage;

/// Widest UTF-8 encoding of a single character. Every string chunk needs at
/// least this much free space so progress is guaranteed.
const MAX_UTF8_CHAR_LEN: usize = 4;
const LENGTH_PREFIX_LEN: usize = 8;
const SEQUENCE_SEPARATOR: &str = ", ";

/// Location of a reserved length prefix: segment index and byte offset.
#[derive(Clone, Copy, Debug)]
pub(super) struct Placeholder {
    segment: usize,
    offset: usize,
}

/// Length of the longest prefix of `s` that fits in `available` bytes and
/// ends on a character boundary.
fn fitting_prefix(s: &str, available: usize) -> usize {
    if s.len() <= available {
        return s.len();
    }
    let mut end = available;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

impl JournalMessage {
    /// Make sure the current segment has `min_size` free bytes, sealing it and
    /// renting a segment sized for `desired` bytes otherwise.
    fn ensure_capacity(&mut self, min_size: usize, desired: usize) {
        let remaining = self
            .current
            .as_ref()
            .map_or(0, |buf| buf.len() - self.written);
        if self.current.is_some() && remaining >= min_size {
            return;
        }
        self.seal_current();
        self.current = Some(self.pool.rent(desired.max(min_size)));
        self.written = 0;
    }

    fn remaining_mut(&mut self) -> &mut [u8] {
        match self.current.as_deref_mut() {
            Some(buf) => &mut buf[self.written..],
            None => &mut [],
        }
    }

    /// Write a short byte run contiguously. Used for names and separators.
    pub(super) fn write_ascii(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len(), bytes.len());
        let len = bytes.len();
        self.remaining_mut()[..len].copy_from_slice(bytes);
        self.written += len;
    }

    /// Write `s` in chunks, spilling into new segments as needed.
    pub(super) fn write_str_chunked(&mut self, s: &str) -> usize {
        let mut rest = s;
        while !rest.is_empty() {
            self.ensure_capacity(MAX_UTF8_CHAR_LEN, rest.len());
            let dst = self.remaining_mut();
            let take = fitting_prefix(rest, dst.len());
            dst[..take].copy_from_slice(&rest.as_bytes()[..take]);
            self.written += take;
            rest = &rest[take..];
        }
        s.len()
    }

    pub(super) fn reserve_length(&mut self) -> Placeholder {
        self.ensure_capacity(LENGTH_PREFIX_LEN, LENGTH_PREFIX_LEN);
        let placeholder = Placeholder {
            segment: self.segments.len(),
            offset: self.written,
        };
        self.remaining_mut()[..LENGTH_PREFIX_LEN].fill(0);
        self.written += LENGTH_PREFIX_LEN;
        placeholder
    }

    /// Fill a reserved length prefix, which may sit in a segment that has
    /// since been sealed.
    pub(super) fn backfill_length(&mut self, placeholder: Placeholder, len: u64) {
        let bytes = len.to_le_bytes();
        let range = placeholder.offset..placeholder.offset + LENGTH_PREFIX_LEN;
        if let Some(segment) = self.segments.get_mut(placeholder.segment) {
            segment.buf[range].copy_from_slice(&bytes);
        } else if let Some(current) = self.current.as_deref_mut() {
            current[range].copy_from_slice(&bytes);
        }
    }

    /// Encode `value`, returning the number of bytes written.
    pub(super) fn write_value(&mut self, value: &Value<'_>) -> usize {
        match value {
            Value::Null => 0,
            Value::Str(s) => self.write_str_chunked(s),
            Value::Seq(items) => {
                let mut first = true;
                self.write_sequence(items, &mut first)
            }
            Value::Scalar(scalar) => self.write_display(scalar),
            Value::Display(display) => self.write_display(*display),
        }
    }

    fn write_sequence(&mut self, items: &[Value<'_>], first: &mut bool) -> usize {
        let mut written = 0;
        for item in items {
            if let Value::Seq(inner) = item {
                written += self.write_sequence(inner, first);
                continue;
            }
            if !*first {
                written += self.write_str_chunked(SEQUENCE_SEPARATOR);
            }
            *first = false;
            written += self.write_value(item);
        }
        written
    }

    fn write_display(&mut self, value: &dyn fmt::Display) -> usize {
        let mut writer = MessageWriter {
            message: self,
            written: 0,
        };
        // A failing Display impl leaves a truncated value; the length prefix
        // still matches what was written.
        let _ = write!(writer, "{value}");
        writer.written
    }
}

/// `fmt::Write` adapter streaming formatted output into a message.
struct MessageWriter<'m> {
    message: &'m mut JournalMessage,
    written: usize,
}

impl fmt::Write for MessageWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.written += self.message.write_str_chunked(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fitting_prefix;
    use rstest::rstest;

    #[rstest]
    #[case("abc", 8, 3)]
    #[case("abcdef", 4, 4)]
    #[case("aé", 2, 1)]
    #[case("€€", 4, 3)]
    #[case("😀x", 4, 4)]
    fn fitting_prefix_respects_char_boundaries(
        #[case] input: &str,
        #[case] available: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(fitting_prefix(input, available), expected);
    }
}
