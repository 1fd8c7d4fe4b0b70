//! # Lane key derivation.
//!
//! A [`KeyExtractor`] maps call arguments to the key of the lane the call is
//! serialized on. It is pure and total: every argument list yields a key.
//!
//! ## Default policy ([`UidKey`])
//! 1. first argument is an object with a string `uid` field → that string
//! 2. first argument is a string → that string
//! 3. anything else (including no arguments) → [`SENTINEL_KEY`]
//!
//! Calls without an identity share the sentinel lane, so system-originated
//! calls still serialize against each other.

use serde_json::Value;

/// Fallback key for calls without a derivable identity.
pub const SENTINEL_KEY: &str = "sys";

/// Derives a lane key from call arguments.
///
/// Implemented for any `Fn(&[Value]) -> String`, so closures can be used directly.
pub trait KeyExtractor: Send + Sync + 'static {
    fn key(&self, args: &[Value]) -> String;
}

impl<F> KeyExtractor for F
where
    F: Fn(&[Value]) -> String + Send + Sync + 'static,
{
    fn key(&self, args: &[Value]) -> String {
        self(args)
    }
}

/// Default extractor: `uid` field, then plain string, then [`SENTINEL_KEY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UidKey;

impl KeyExtractor for UidKey {
    fn key(&self, args: &[Value]) -> String {
        derive_key(args)
    }
}

/// Applies the default key policy.
///
/// # Example
/// ```
/// use keylane::derive_key;
/// use serde_json::json;
///
/// assert_eq!(derive_key(&[json!({ "uid": "u1" })]), "u1");
/// assert_eq!(derive_key(&[json!("u2")]), "u2");
/// assert_eq!(derive_key(&[json!({})]), "sys");
/// ```
pub fn derive_key(args: &[Value]) -> String {
    match args.first() {
        Some(Value::Object(map)) => match map.get("uid") {
            Some(Value::String(uid)) => uid.clone(),
            _ => SENTINEL_KEY.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        _ => SENTINEL_KEY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uid_wins_over_other_fields() {
        assert_eq!(derive_key(&[json!({ "uid": "u1", "name": "x" }), json!("u9")]), "u1");
    }

    #[test]
    fn non_string_uid_falls_back_to_sentinel() {
        assert_eq!(derive_key(&[json!({ "uid": 42 })]), SENTINEL_KEY);
    }

    #[test]
    fn only_first_argument_is_inspected() {
        assert_eq!(derive_key(&[json!(7), json!("u2")]), SENTINEL_KEY);
        assert_eq!(derive_key(&[]), SENTINEL_KEY);
    }

    #[test]
    fn closures_are_extractors() {
        let by_room = |args: &[Value]| {
            args.get(1)
                .and_then(Value::as_str)
                .map_or_else(|| SENTINEL_KEY.to_string(), |room| format!("room:{room}"))
        };
        assert_eq!(by_room.key(&[json!("u1"), json!("lobby")]), "room:lobby");
    }
}
