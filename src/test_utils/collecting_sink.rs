//! In-memory [`Connector`] and [`DatagramSink`] implementations.
//!
//! [`CollectingSink`] records every datagram it is asked to send and can be
//! scripted to fail the next sends with chosen errors. [`CollectingConnector`]
//! hands out sinks sharing one recording and counts connects and live sinks.

use std::{
    collections::VecDeque,
    io::{self, IoSlice},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;

use crate::journal::{Connector, DatagramSink, SendMode};

/// A datagram captured by [`CollectingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    /// Number of slices the datagram was sent as.
    pub iovecs: usize,
    pub mode: SendMode,
}

#[derive(Debug, Default)]
struct SinkState {
    sent: Vec<Datagram>,
    script: VecDeque<io::Error>,
    attempts: usize,
}

/// Sink recording datagrams in memory.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    state: Arc<Mutex<SinkState>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next unscripted send with `err`.
    pub fn push_error(&self, err: io::Error) {
        self.state.lock().script.push_back(err);
    }

    /// Datagrams sent successfully so far.
    pub fn datagrams(&self) -> Vec<Datagram> {
        self.state.lock().sent.clone()
    }

    /// Number of send calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }
}

impl DatagramSink for CollectingSink {
    fn send_vectored(&self, bufs: &[IoSlice<'_>], mode: SendMode) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if let Some(err) = state.script.pop_front() {
            return Err(err);
        }
        let bytes: Vec<u8> = bufs.iter().flat_map(|buf| buf.iter().copied()).collect();
        let len = bytes.len();
        state.sent.push(Datagram {
            bytes,
            iovecs: bufs.len(),
            mode,
        });
        Ok(len)
    }
}

/// Sink handed out by [`CollectingConnector`]; tracks how many are alive.
#[derive(Debug)]
struct TrackedSink {
    inner: CollectingSink,
    live: Arc<AtomicUsize>,
}

impl DatagramSink for TrackedSink {
    fn send_vectored(&self, bufs: &[IoSlice<'_>], mode: SendMode) -> io::Result<usize> {
        self.inner.send_vectored(bufs, mode)
    }
}

impl Drop for TrackedSink {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Connector whose sinks all record into one [`CollectingSink`].
#[derive(Debug, Default)]
pub struct CollectingConnector {
    sink: CollectingSink,
    connect_errors: Mutex<VecDeque<io::Error>>,
    connects: AtomicUsize,
    live: Arc<AtomicUsize>,
    connect_delay: Option<Duration>,
}

impl CollectingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every connect, widening races between first senders.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Fail the next connect with `err`.
    pub fn push_connect_error(&self, err: io::Error) {
        self.connect_errors.lock().push_back(err);
    }

    /// The recording shared by every sink from this connector.
    pub fn sink(&self) -> &CollectingSink {
        &self.sink
    }

    /// Number of connect calls, including failed ones.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Sinks created and not yet dropped.
    pub fn live_sinks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Connector for CollectingConnector {
    fn connect(&self, _path: &Path) -> io::Result<Box<dyn DatagramSink>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.connect_delay {
            thread::sleep(delay);
        }
        if let Some(err) = self.connect_errors.lock().pop_front() {
            return Err(err);
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedSink {
            inner: self.sink.clone(),
            live: Arc::clone(&self.live),
        }))
    }
}
