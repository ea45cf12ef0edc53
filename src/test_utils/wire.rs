//! Decoder for the journal wire format.

use std::collections::BTreeMap;

/// Decode a datagram into `(name, value)` pairs in wire order.
///
/// Panics on malformed input; only meant for assertions.
pub fn decode_fields(mut bytes: &[u8]) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    while !bytes.is_empty() {
        let name_len = bytes
            .iter()
            .position(|&b| b == b'\n')
            .expect("field name is newline terminated");
        let name = String::from_utf8(bytes[..name_len].to_vec()).expect("name is utf-8");
        bytes = &bytes[name_len + 1..];
        let (len_bytes, rest) = bytes.split_at(8);
        let value_len = u64::from_le_bytes(len_bytes.try_into().expect("8 byte length"));
        let value_len = usize::try_from(value_len).expect("length fits usize");
        let value = String::from_utf8(rest[..value_len].to_vec()).expect("value is utf-8");
        assert_eq!(rest[value_len], b'\n', "value must be newline terminated");
        bytes = &rest[value_len + 1..];
        fields.push((name, value));
    }
    fields
}

/// Decode a datagram into a map; later duplicates win, as in the journal.
pub fn decode_fields_map(bytes: &[u8]) -> BTreeMap<String, String> {
    decode_fields(bytes).into_iter().collect()
}
