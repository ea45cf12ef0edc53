//! Datagram transport primitives.
//!
//! The journal client only needs two operations from the platform: open a
//! connected datagram socket to a path, and send an ordered list of byte
//! slices as one datagram. [`Connector`] and [`DatagramSink`] capture exactly
//! that, so the client's retry and classification logic can be exercised with
//! scripted sinks.

use std::{
    fmt,
    io::{self, IoSlice},
    path::Path,
};

use crate::message::Segment;

/// Number of `IoSlice`s built on the stack before falling back to the heap.
const INLINE_IOVECS: usize = 20;

/// Whether a send may block waiting for socket buffer space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMode {
    Blocking,
    /// Fail with `WouldBlock` instead of waiting.
    NonBlocking,
}

/// A connected datagram socket.
pub trait DatagramSink: Send + Sync + fmt::Debug {
    /// Send `bufs` as a single datagram.
    fn send_vectored(&self, bufs: &[IoSlice<'_>], mode: SendMode) -> io::Result<usize>;
}

/// Opens [`DatagramSink`]s.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Connect a datagram socket to `path`.
    fn connect(&self, path: &Path) -> io::Result<Box<dyn DatagramSink>>;
}

/// Connector producing `AF_UNIX` datagram sockets.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnixDatagramConnector;

#[cfg(unix)]
mod unix {
    use std::{
        io::{self, IoSlice},
        path::Path,
    };

    use socket2::{Domain, SockAddr, Socket, Type};

    use super::{Connector, DatagramSink, SendMode, UnixDatagramConnector};

    #[derive(Debug)]
    struct UnixDatagramSink {
        socket: Socket,
    }

    impl DatagramSink for UnixDatagramSink {
        fn send_vectored(&self, bufs: &[IoSlice<'_>], mode: SendMode) -> io::Result<usize> {
            let flags = match mode {
                SendMode::Blocking => 0,
                SendMode::NonBlocking => libc::MSG_DONTWAIT,
            };
            self.socket.send_vectored_with_flags(bufs, flags)
        }
    }

    impl Connector for UnixDatagramConnector {
        fn connect(&self, path: &Path) -> io::Result<Box<dyn DatagramSink>> {
            let socket = Socket::new(Domain::UNIX, Type::DGRAM, None)?;
            socket.connect(&SockAddr::unix(path)?)?;
            Ok(Box::new(UnixDatagramSink { socket }))
        }
    }
}

#[cfg(not(unix))]
impl Connector for UnixDatagramConnector {
    fn connect(&self, _path: &Path) -> io::Result<Box<dyn DatagramSink>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix datagram sockets are not supported on this platform",
        ))
    }
}

/// How a failed connect should be reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConnectFailure {
    /// The platform cannot create this kind of socket.
    Unsupported,
    /// The socket path does not exist or nobody is listening on it.
    Absent,
    /// Anything else.
    Fatal,
}

pub(crate) fn classify_connect_error(err: &io::Error) -> ConnectFailure {
    #[cfg(unix)]
    if let Some(code) = err.raw_os_error() {
        match code {
            libc::EAFNOSUPPORT | libc::EPROTONOSUPPORT | libc::ESOCKTNOSUPPORT => {
                return ConnectFailure::Unsupported;
            }
            libc::ENOENT | libc::ENOTDIR | libc::ECONNREFUSED => return ConnectFailure::Absent,
            _ => {}
        }
    }
    match err.kind() {
        io::ErrorKind::Unsupported => ConnectFailure::Unsupported,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => ConnectFailure::Absent,
        _ => ConnectFailure::Fatal,
    }
}

/// Send `segments` as one datagram, retrying while the call is interrupted.
///
/// Up to [`INLINE_IOVECS`] slices are assembled on the stack.
pub(crate) fn send_segments(
    sink: &dyn DatagramSink,
    segments: &[Segment],
    mode: SendMode,
) -> io::Result<usize> {
    if segments.len() <= INLINE_IOVECS {
        let mut iovs = [IoSlice::new(&[]); INLINE_IOVECS];
        for (iov, segment) in iovs.iter_mut().zip(segments) {
            *iov = IoSlice::new(segment.as_bytes());
        }
        send_retrying(sink, &iovs[..segments.len()], mode)
    } else {
        let iovs: Vec<IoSlice<'_>> = segments
            .iter()
            .map(|segment| IoSlice::new(segment.as_bytes()))
            .collect();
        send_retrying(sink, &iovs, mode)
    }
}

fn send_retrying(
    sink: &dyn DatagramSink,
    iovs: &[IoSlice<'_>],
    mode: SendMode,
) -> io::Result<usize> {
    loop {
        match sink.send_vectored(iovs, mode) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(io::Error::from(io::ErrorKind::Unsupported), ConnectFailure::Unsupported)]
    #[case(io::Error::from(io::ErrorKind::NotFound), ConnectFailure::Absent)]
    #[case(io::Error::from(io::ErrorKind::ConnectionRefused), ConnectFailure::Absent)]
    #[case(io::Error::from(io::ErrorKind::PermissionDenied), ConnectFailure::Fatal)]
    fn classifies_error_kinds(#[case] err: io::Error, #[case] expected: ConnectFailure) {
        assert_eq!(classify_connect_error(&err), expected);
    }

    #[cfg(unix)]
    #[rstest]
    #[case(libc::EAFNOSUPPORT, ConnectFailure::Unsupported)]
    #[case(libc::ENOENT, ConnectFailure::Absent)]
    #[case(libc::ECONNREFUSED, ConnectFailure::Absent)]
    #[case(libc::EACCES, ConnectFailure::Fatal)]
    fn classifies_errno(#[case] code: i32, #[case] expected: ConnectFailure) {
        let err = io::Error::from_raw_os_error(code);
        assert_eq!(classify_connect_error(&err), expected);
    }

    #[cfg(unix)]
    #[rstest]
    fn missing_path_is_absent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = UnixDatagramConnector
            .connect(&dir.path().join("missing.sock"))
            .expect_err("nothing is bound there");
        assert_eq!(classify_connect_error(&err), ConnectFailure::Absent);
    }
}
