//! Cache Key Fingerprinting
//!
//! Turns an arbitrary parameter set into a stable cache key: canonical JSON
//! encoding (object keys sorted lexicographically) followed by a 128-bit MD5
//! digest rendered as hex.
//!
//! The digest is a cache-key fingerprint, not a security control. A collision
//! would only cause a spurious cache hit; it must never be reused for
//! identity or authorization decisions.

use serde::Serialize;

use crate::error::{GatewayError, Result};

// == Fingerprint ==
/// Computes a deterministic, order-independent key for a parameter set.
///
/// The parameters are first converted to a `serde_json::Value`; its object
/// representation is a sorted map, so two parameter sets that are equal as
/// sets of (key, value) pairs produce identical canonical text regardless of
/// insertion order.
///
/// Unserializable parameter sets (e.g. maps with non-string keys) surface
/// as [`GatewayError::Encoding`] rather than degrading to a constant key.
pub fn fingerprint<T: Serialize>(params: &T) -> Result<String> {
    let canonical = serde_json::to_value(params)
        .map_err(|e| GatewayError::Encoding(e.to_string()))?;
    let text = serde_json::to_string(&canonical)
        .map_err(|e| GatewayError::Encoding(e.to_string()))?;
    Ok(format!("{:x}", md5::compute(text.as_bytes())))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    #[test]
    fn test_fingerprint_is_order_independent() {
        // Same pairs, different textual order
        let a: Value =
            serde_json::from_str(r#"{"start":"2025-01-01","end":"2025-01-31","tenant":"t1"}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"tenant":"t1","end":"2025-01-31","start":"2025-01-01"}"#)
                .unwrap();

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_order_independent_for_hashmaps() {
        let mut a = HashMap::new();
        a.insert("alpha", 1);
        a.insert("beta", 2);
        a.insert("gamma", 3);

        let mut b = HashMap::new();
        b.insert("gamma", 3);
        b.insert("alpha", 1);
        b.insert("beta", 2);

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_nested_objects() {
        let a = json!({"outer": {"x": 1, "y": 2}, "flag": true});
        let b = json!({"flag": true, "outer": {"y": 2, "x": 1}});

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_distinguishes_values() {
        let a = json!({"start": "2025-01-01"});
        let b = json!({"start": "2025-01-02"});

        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_distinguishes_keys() {
        let a = json!({"start": "2025-01-01"});
        let b = json!({"end": "2025-01-01"});

        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_is_fixed_width_hex() {
        let key = fingerprint(&json!({"k": "v"})).unwrap();
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_rejects_unserializable_values() {
        // JSON object keys must be strings; a tuple key cannot be encoded
        let mut params = HashMap::new();
        params.insert((1u32, 2u32), "value");

        let result = fingerprint(&params);
        assert!(matches!(result, Err(GatewayError::Encoding(_))));
    }
}
