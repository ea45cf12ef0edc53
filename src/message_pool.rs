//! Reuse of [`JournalMessage`] instances between log calls.
//!
//! Each logical caller context (a worker, a thread, a connection) is
//! identified by a [`PoolKey`]. The pool keeps at most one idle message per
//! key so the segment list allocated for one record is reused by the next
//! record from the same context.

use std::{
    collections::{HashMap, hash_map::Entry},
    hash::{DefaultHasher, Hash, Hasher},
    ops::{Deref, DerefMut},
    sync::Arc,
    thread::ThreadId,
};

use parking_lot::Mutex;

use crate::{buffer_pool::BufferPool, message::JournalMessage};

/// Default upper bound on the number of cached messages.
pub const DEFAULT_MAX_CACHED_MESSAGES: usize = 256;

/// Identifies the caller context a cached message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey(u64);

impl PoolKey {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Key derived from a thread identifier.
    pub fn from_thread(id: ThreadId) -> Self {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Key for the calling thread.
    pub fn current_thread() -> Self {
        Self::from_thread(std::thread::current().id())
    }
}

/// Bounded cache of idle messages keyed by [`PoolKey`].
#[derive(Debug)]
pub struct MessagePool {
    buffers: Arc<BufferPool>,
    idle: Mutex<HashMap<PoolKey, JournalMessage>>,
    max_cached: usize,
}

impl MessagePool {
    pub fn new(buffers: Arc<BufferPool>, max_cached: usize) -> Self {
        Self {
            buffers,
            idle: Mutex::new(HashMap::new()),
            max_cached,
        }
    }

    /// The buffer pool backing messages created by this pool.
    pub fn buffers(&self) -> &Arc<BufferPool> {
        &self.buffers
    }

    /// Take the cached message for `key`, or create one. The message is empty
    /// and enabled according to `enabled`.
    pub fn acquire(&self, key: PoolKey, enabled: bool) -> JournalMessage {
        let cached = self.idle.lock().remove(&key);
        let mut message =
            cached.unwrap_or_else(|| JournalMessage::new(Arc::clone(&self.buffers), enabled));
        message.set_enabled(enabled);
        message
    }

    /// Clear `message` and cache it under `key`.
    ///
    /// When an instance is already cached for the key, the one with the larger
    /// segment list capacity is kept.
    pub fn release(&self, key: PoolKey, mut message: JournalMessage) {
        message.clear();
        let mut idle = self.idle.lock();
        let cached_count = idle.len();
        match idle.entry(key) {
            Entry::Occupied(mut slot) => {
                if message.segment_capacity() > slot.get().segment_capacity() {
                    slot.insert(message);
                }
            }
            Entry::Vacant(slot) => {
                if cached_count < self.max_cached {
                    slot.insert(message);
                }
            }
        }
    }

    /// Acquire a message that returns itself to the pool when dropped.
    pub fn get(&self, key: PoolKey, enabled: bool) -> PooledMessage<'_> {
        PooledMessage {
            pool: self,
            key,
            message: Some(self.acquire(key, enabled)),
        }
    }

    /// Number of idle messages currently cached.
    pub fn cached(&self) -> usize {
        self.idle.lock().len()
    }
}

/// A message on loan from a [`MessagePool`].
#[derive(Debug)]
pub struct PooledMessage<'p> {
    pool: &'p MessagePool,
    key: PoolKey,
    message: Option<JournalMessage>,
}

impl PooledMessage<'_> {
    pub fn key(&self) -> PoolKey {
        self.key
    }
}

impl Deref for PooledMessage<'_> {
    type Target = JournalMessage;

    fn deref(&self) -> &JournalMessage {
        // Only `drop` takes the message out.
        self.message.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledMessage<'_> {
    fn deref_mut(&mut self) -> &mut JournalMessage {
        self.message.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledMessage<'_> {
    fn drop(&mut self) {
        if let Some(message) = self.message.take() {
            self.pool.release(self.key, message);
        }
    }
}
