//! Request fingerprints
//!
//! A fingerprint is the SHA-256 of a canonical JSON rendering of
//! `{"m": METHOD, "u": url, "p": params, "d": body}`: object keys sorted,
//! no whitespace, non-ASCII left as UTF-8. Field order in the caller's maps
//! never changes the hash.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the hex fingerprint for a request.
pub fn fingerprint(method: &str, url: &str, params: &Value, body: &Value) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert("m".to_string(), Value::String(method.to_uppercase()));
    payload.insert("u".to_string(), Value::String(url.to_string()));
    payload.insert("p".to_string(), empty_if_null(params));
    payload.insert("d".to_string(), empty_if_null(body));

    let canonical = canonical_json(&Value::Object(payload));
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{:x}", digest)
}

fn empty_if_null(value: &Value) -> Value {
    match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    }
}

/// Render a JSON value with sorted object keys and compact separators.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_scalar(&Value::String((*key).clone()), out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut String) {
    // Scalars never fail to serialize
    out.push_str(&serde_json::to_string(value).unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_sorts_nested_keys() {
        let v = json!({"b": 1, "a": {"z": [3, {"y": true, "x": null}], "c": "é"}});
        assert_eq!(
            canonical_json(&v),
            r#"{"a":{"c":"é","z":[3,{"x":null,"y":true}]},"b":1}"#
        );
    }

    #[test]
    fn test_fingerprint_independent_of_field_order() {
        let mut p1 = serde_json::Map::new();
        p1.insert("target".into(), json!("TP53"));
        p1.insert("assembly".into(), json!("hg38"));
        let mut p2 = serde_json::Map::new();
        p2.insert("assembly".into(), json!("hg38"));
        p2.insert("target".into(), json!("TP53"));

        let a = fingerprint("get", "https://x/api", &Value::Object(p1), &Value::Null);
        let b = fingerprint("GET", "https://x/api", &Value::Object(p2), &json!({}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_distinguishes_inputs() {
        let params = json!({"target": "TP53"});
        let base = fingerprint("GET", "https://x/api", &params, &Value::Null);
        assert_ne!(base, fingerprint("POST", "https://x/api", &params, &Value::Null));
        assert_ne!(base, fingerprint("GET", "https://y/api", &params, &Value::Null));
        assert_ne!(
            base,
            fingerprint("GET", "https://x/api", &json!({"target": "MDM2"}), &Value::Null)
        );
        assert_ne!(
            base,
            fingerprint("GET", "https://x/api", &params, &json!({"limit": 1}))
        );
    }

    #[test]
    fn test_numbers_and_strings_hash_differently() {
        let a = fingerprint("GET", "u", &json!({"limit": 1}), &Value::Null);
        let b = fingerprint("GET", "u", &json!({"limit": "1"}), &Value::Null);
        assert_ne!(a, b);
    }
}
