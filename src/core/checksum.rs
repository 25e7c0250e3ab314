//! Content hashes used to correlate audit entries and spot duplicate
//! candidates. They carry no security meaning.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of arbitrary bytes.
pub fn content_hash(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Hash of a JSON value's canonical serialization.
///
/// `serde_json::Map` keeps keys sorted, so two payloads that differ only in
/// key order or whitespace hash the same.
pub fn json_hash(value: &serde_json::Value) -> String {
    content_hash(value.to_string())
}

/// Hash of several fields joined with NUL separators so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn fields_hash<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_hex_sha256() {
        let hash = content_hash("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn json_hash_ignores_key_order_and_whitespace() {
        let a: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": [1, 2]}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{ "a":[1,2],"b":1 }"#).unwrap();
        assert_eq!(json_hash(&a), json_hash(&b));
    }

    #[test]
    fn fields_hash_separates_fields() {
        assert_ne!(fields_hash(["ab", "c"]), fields_hash(["a", "bc"]));
        assert_eq!(fields_hash(["x", "y"]), fields_hash(["x", "y"]));
    }
}
