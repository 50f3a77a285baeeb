// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde helpers for lexical duration forms.

/// Serde helpers for `Duration` represented as a millisecond integer (`u64`).
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize `Duration` to integer milliseconds.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    /// Deserialize `Duration` from integer milliseconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct WithDuration {
        #[serde(with = "crate::serde_support::duration_millis")]
        value: Duration,
    }

    #[test]
    fn millis_roundtrip() {
        let original = WithDuration {
            value: Duration::from_millis(1_234),
        };
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, r#"{"value":1234}"#);
        let back: WithDuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
