//! The `log` bridge installed as the global logger, sending to a real peer.
#![cfg(all(unix, feature = "log-compat"))]

mod test_utils;

use std::sync::Arc;

use femtojournal::{JournalLogAdapter, JournalLogOptions, install};
use log::LevelFilter;
use rstest::rstest;
use test_utils::{JournalPeer, journal_peer, recv_fields};

#[rstest]
fn log_macros_reach_the_journal(journal_peer: JournalPeer) {
    let client = Arc::new(journal_peer.client(|config| config));
    let adapter = JournalLogAdapter::new(
        client,
        JournalLogOptions::default().with_level(LevelFilter::Info),
    );
    install(adapter).expect("no other global logger");

    log::debug!("filtered out");
    log::info!(request_id = 17, peer = "10.0.0.1"; "handled {} bytes", 512);

    let fields = recv_fields(&journal_peer);
    assert_eq!(fields["MESSAGE"], "handled 512 bytes");
    assert_eq!(fields["PRIORITY"], "6");
    assert_eq!(fields["LOGGER"], module_path!());
    assert_eq!(fields["REQUEST_ID"], "17");
    assert_eq!(fields["PEER"], "10.0.0.1");
    assert_eq!(fields["CODE_FILE"], file!());
    assert!(fields.contains_key("CODE_LINE"));

    log::warn!("second");
    assert_eq!(recv_fields(&journal_peer)["MESSAGE"], "second");
    assert!(install(JournalLogAdapter::new(
        Arc::new(journal_peer.client(|config| config)),
        JournalLogOptions::default(),
    ))
    .is_err());
}
