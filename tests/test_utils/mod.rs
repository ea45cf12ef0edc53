pub mod fixtures;

pub use fixtures::{JournalPeer, journal_peer, recv_fields};
