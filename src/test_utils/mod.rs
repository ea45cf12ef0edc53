//! Helpers shared by unit and integration tests.
//!
//! Compiled for unit tests and for downstream tests through the `test-util`
//! feature.

pub mod collecting_sink;
pub mod wire;

pub use collecting_sink::{CollectingConnector, CollectingSink, Datagram};
pub use wire::{decode_fields, decode_fields_map};
