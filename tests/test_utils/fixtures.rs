//! Fixtures that stand up a real datagram socket in a temporary directory
//! and point a [`JournalClient`] at it, so the full send path can be
//! exercised without a running journal.

use std::{collections::BTreeMap, os::unix::net::UnixDatagram, path::PathBuf, time::Duration};

use femtojournal::{JournalClient, JournalConfig, test_utils::decode_fields_map};
use rstest::fixture;
use tempfile::TempDir;

/// Largest datagram the tests expect to receive.
const RECV_BUFFER_LEN: usize = 256 * 1024;

/// A bound socket standing in for the journal.
pub struct JournalPeer {
    // Keeps the socket path alive.
    _dir: TempDir,
    pub path: PathBuf,
    pub socket: UnixDatagram,
}

impl JournalPeer {
    /// A client configured to send to this peer.
    pub fn client(&self, tweak: impl FnOnce(JournalConfig) -> JournalConfig) -> JournalClient {
        let config = JournalConfig::default()
            .with_socket_path(&self.path)
            .with_syslog_identifier(Some("femtojournal-tests"));
        JournalClient::new(tweak(config)).expect("valid configuration")
    }
}

/// Bind a datagram socket in a fresh temporary directory.
#[fixture]
pub fn journal_peer() -> JournalPeer {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("journal.sock");
    let socket = UnixDatagram::bind(&path).expect("bind peer socket");
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    JournalPeer {
        _dir: dir,
        path,
        socket,
    }
}

/// Receive one datagram and decode its fields.
pub fn recv_fields(peer: &JournalPeer) -> BTreeMap<String, String> {
    let mut buf = vec![0u8; RECV_BUFFER_LEN];
    let len = peer.socket.recv(&mut buf).expect("datagram received");
    decode_fields_map(&buf[..len])
}
