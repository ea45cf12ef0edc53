//! Property-based tests for field names and message encoding.
//!
//! Arbitrary runtime keys must always sanitize into names the strict
//! constructor accepts, and arbitrary text must survive the wire encoding
//! byte for byte however it is split across segments.

use std::sync::Arc;

use femtojournal::{
    BufferPool, FieldName, JournalMessage, MAX_FIELD_NAME_LEN, test_utils::decode_fields,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitized_keys_are_valid_names(key in "\\PC{0,100}") {
        let name = FieldName::sanitized(&key);
        prop_assert!(name.len() <= MAX_FIELD_NAME_LEN);
        prop_assert!(FieldName::new(name.as_str()).is_ok());
    }

    #[test]
    fn valid_names_are_accepted_unchanged(name in "[A-Z][A-Z0-9_]{0,63}") {
        let field = FieldName::new(&name).expect("generated names are valid");
        prop_assert_eq!(field.as_str(), name.as_str());
        let sanitized = FieldName::sanitized(&name);
        prop_assert_eq!(sanitized.as_str(), name.as_str());
    }

    #[test]
    fn arbitrary_text_round_trips(
        ref values in proptest::collection::vec("\\PC{0,3000}", 1..8),
        min_segment_size in 1usize..8192,
    ) {
        let pool = Arc::new(BufferPool::new(8, min_segment_size));
        let mut message = JournalMessage::new(pool, true);
        let name = FieldName::new("VALUE").expect("valid field name");
        for value in values {
            message.append(&name, value.as_str());
        }
        let fields = decode_fields(&message.to_bytes());
        prop_assert_eq!(fields.len(), values.len());
        for ((_, decoded), expected) in fields.iter().zip(values) {
            prop_assert_eq!(decoded, expected);
        }
    }
}
