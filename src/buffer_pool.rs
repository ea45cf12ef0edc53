//! Shared pool of byte segments used by journal messages.
//!
//! Messages rent fixed-size segments while they are being built and return
//! them when they are sent or cleared. Segment sizes are rounded up to a
//! power of two so returned buffers can satisfy later requests of similar
//! size.

use parking_lot::Mutex;

/// Smallest segment handed out by the pool.
pub const MIN_SEGMENT_SIZE: usize = 4096;
/// Default number of idle segments retained by a pool.
pub const DEFAULT_MAX_RETAINED: usize = 64;
/// Segments larger than this are freed rather than retained.
pub const MAX_RETAINED_SEGMENT_SIZE: usize = 1 << 20;

/// Thread-safe rent/return pool of byte segments.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Box<[u8]>>>,
    max_retained: usize,
    min_segment_size: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETAINED, MIN_SEGMENT_SIZE)
    }
}

impl BufferPool {
    /// Create a pool retaining at most `max_retained` idle segments, each at
    /// least `min_segment_size` bytes.
    pub fn new(max_retained: usize, min_segment_size: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
            min_segment_size: min_segment_size.max(1),
        }
    }

    /// Segment size that [`rent`](Self::rent) would hand out for `min_len`.
    pub fn segment_size_for(&self, min_len: usize) -> usize {
        let wanted = min_len.max(self.min_segment_size);
        wanted.checked_next_power_of_two().unwrap_or(wanted)
    }

    /// Rent a segment of at least `min_len` bytes.
    pub fn rent(&self, min_len: usize) -> Box<[u8]> {
        let size = self.segment_size_for(min_len);
        {
            let mut free = self.free.lock();
            if let Some(pos) = free.iter().position(|buf| buf.len() >= size) {
                return free.swap_remove(pos);
            }
        }
        vec![0u8; size].into_boxed_slice()
    }

    /// Return a segment to the pool.
    pub fn give_back(&self, buf: Box<[u8]>) {
        if buf.len() > MAX_RETAINED_SEGMENT_SIZE {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(buf);
        }
    }

    /// Number of idle segments currently retained.
    pub fn retained(&self) -> usize {
        self.free.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 4096)]
    #[case(4096, 4096)]
    #[case(4097, 8192)]
    #[case(8000, 8192)]
    fn rounds_segment_sizes(#[case] min_len: usize, #[case] expected: usize) {
        let pool = BufferPool::default();
        assert_eq!(pool.rent(min_len).len(), expected);
    }

    #[rstest]
    fn reuses_returned_segments() {
        let pool = BufferPool::default();
        let buf = pool.rent(10);
        let ptr = buf.as_ptr();
        pool.give_back(buf);
        assert_eq!(pool.retained(), 1);
        let again = pool.rent(10);
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(pool.retained(), 0);
    }

    #[rstest]
    fn small_segments_do_not_satisfy_large_requests() {
        let pool = BufferPool::default();
        pool.give_back(pool.rent(10));
        let big = pool.rent(10_000);
        assert_eq!(big.len(), 16384);
        assert_eq!(pool.retained(), 1);
    }

    #[rstest]
    fn retention_is_bounded() {
        let pool = BufferPool::new(2, MIN_SEGMENT_SIZE);
        for _ in 0..5 {
            pool.give_back(vec![0u8; MIN_SEGMENT_SIZE].into_boxed_slice());
        }
        assert_eq!(pool.retained(), 2);
    }

    #[rstest]
    fn oversized_segments_are_freed() {
        let pool = BufferPool::default();
        pool.give_back(vec![0u8; MAX_RETAINED_SEGMENT_SIZE * 2].into_boxed_slice());
        assert_eq!(pool.retained(), 0);
    }
}
