//! Incrementally built journal messages.
//!
//! A [`JournalMessage`] holds one log record as a chain of byte segments
//! rented from a [`BufferPool`]. Each call to [`JournalMessage::append`]
//! writes a complete field record:
//!
//! ```text
//! NAME "\n" <u64 little-endian value length> VALUE "\n"
//! ```
//!
//! The length is reserved before the value is encoded and filled in
//! afterwards, so values of unknown size (formatted scalars, sequences) can be
//! streamed straight into the segments without an intermediate `String`.

mod encode;


use std::{fmt, ops::Deref, sync::Arc};

use crate::{
    buffer_pool::BufferPool,
    field_name::{FieldName, MAX_FIELD_NAME_LEN, sanitize_into},
    value::Value,
};

/// A sealed chunk of a message.
pub struct Segment {
    buf: Box<[u8]>,
    len: usize,
}

impl Segment {
    /// The written bytes of this segment.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Deref for Segment {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("len", &self.len)
            .field("capacity", &self.buf.len())
            .finish()
    }
}

/// A structured log record under construction.
///
/// Messages are normally obtained from a
/// [`MessagePool`](crate::message_pool::MessagePool) so their segment list is
/// reused between records. A disabled message ignores every append; the
/// journal client hands out disabled messages when the journal is known to
/// be absent.
pub struct JournalMessage {
    pool: Arc<BufferPool>,
    enabled: bool,
    segments: Vec<Segment>,
    current: Option<Box<[u8]>>,
    written: usize,
}

impl JournalMessage {
    /// Create an empty message backed by `pool`.
    pub fn new(pool: Arc<BufferPool>, enabled: bool) -> Self {
        Self {
            pool,
            enabled,
            segments: Vec::new(),
            current: None,
            written: 0,
        }
    }

    /// Whether appends are recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.written == 0 && self.segments.is_empty()
    }

    /// Append a field. Does nothing when the message is disabled or the value
    /// is [`Value::Null`].
    pub fn append<'v>(&mut self, name: &FieldName, value: impl Into<Value<'v>>) {
        if !self.enabled {
            return;
        }
        let value = value.into();
        if value.is_null() {
            return;
        }
        self.append_field(name.as_bytes(), &value);
    }

    /// Like [`append`](Self::append) for a value the caller keeps ownership of.
    pub fn append_value(&mut self, name: &FieldName, value: &Value<'_>) {
        if self.enabled && !value.is_null() {
            self.append_field(name.as_bytes(), value);
        }
    }

    /// Append a field whose name comes from an arbitrary runtime key.
    ///
    /// The key is sanitized with [`sanitize_into`] instead of being rejected.
    pub fn append_sanitized<'v>(&mut self, key: &str, value: impl Into<Value<'v>>) {
        if !self.enabled {
            return;
        }
        let value = value.into();
        if value.is_null() {
            return;
        }
        let mut name = [0u8; MAX_FIELD_NAME_LEN];
        let len = sanitize_into(key, &mut name);
        self.append_field(&name[..len], &value);
    }

    fn append_field(&mut self, name: &[u8], value: &Value<'_>) {
        self.write_ascii(name);
        self.write_ascii(b"\n");
        let placeholder = self.reserve_length();
        let len = self.write_value(value);
        self.backfill_length(placeholder, len as u64);
        self.write_ascii(b"\n");
    }

    /// Seal the current segment and return every segment written so far.
    ///
    /// Calling this repeatedly is harmless; later appends start a new
    /// segment.
    pub fn wire_segments(&mut self) -> &[Segment] {
        self.seal_current();
        &self.segments
    }

    /// Copy the wire representation into a contiguous buffer.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        let segments = self.wire_segments();
        let mut out = Vec::with_capacity(segments.iter().map(|s| s.len).sum());
        for segment in segments {
            out.extend_from_slice(segment.as_bytes());
        }
        out
    }

    /// Total number of bytes written.
    pub fn wire_len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum::<usize>() + self.written
    }

    /// Number of segments, counting the one being written.
    pub fn segment_count(&self) -> usize {
        self.segments.len() + usize::from(self.current.is_some())
    }

    /// Capacity of the segment list; used by the message pool to decide which
    /// instance is worth keeping.
    pub(crate) fn segment_capacity(&self) -> usize {
        self.segments.capacity()
    }

    /// Return every segment to the buffer pool and reset the message.
    pub fn clear(&mut self) {
        if let Some(current) = self.current.take() {
            self.pool.give_back(current);
        }
        for segment in self.segments.drain(..) {
            self.pool.give_back(segment.buf);
        }
        self.written = 0;
    }

    fn seal_current(&mut self) {
        let Some(buf) = self.current.take() else {
            return;
        };
        if self.written == 0 {
            self.pool.give_back(buf);
        } else {
            self.segments.push(Segment {
                buf,
                len: self.written,
            });
        }
        self.written = 0;
    }
}

impl Drop for JournalMessage {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for JournalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalMessage")
            .field("enabled", &self.enabled)
            .field("segments", &self.segment_count())
            .field("wire_len", &self.wire_len())
            .finish()
    }
}
