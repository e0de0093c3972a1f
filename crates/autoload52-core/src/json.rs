//! JSON operations using sonic-rs.

use crate::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};

/// Deserialize JSON string.
///
/// # Errors
/// Returns error if JSON is invalid.
pub fn from_json<T: DeserializeOwned>(s: &str) -> Result<T> {
    sonic_rs::from_str(s).map_err(Error::from)
}

/// Deserialize JSON bytes.
///
/// # Errors
/// Returns error if JSON is invalid.
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    sonic_rs::from_slice(bytes).map_err(Error::from)
}

/// Serialize to pretty JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    sonic_rs::to_string_pretty(value).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Config {
        #[serde(rename = "vendor-dir", default)]
        vendor_dir: Option<String>,
        #[serde(default)]
        extra: BTreeMap<String, String>,
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config: Config = from_json(r#"{"vendor-dir": "lib"}"#).unwrap();
        assert_eq!(config.vendor_dir.as_deref(), Some("lib"));
        assert!(config.extra.is_empty());
    }

    #[test]
    fn slice_and_str_agree() {
        let raw = r#"{"vendor-dir": "deps", "extra": {"a": "b"}}"#;
        let a: Config = from_json(raw).unwrap();
        let b: Config = from_json_slice(raw.as_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_json_maps_to_json_error() {
        let err = from_json::<Config>("{not json").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::E0602);
    }

    #[test]
    fn pretty_output_round_trips() {
        let config = Config {
            vendor_dir: Some("vendor".into()),
            extra: BTreeMap::new(),
        };
        let text = to_json_pretty(&config).unwrap();
        assert!(text.contains('\n'));
        let back: Config = from_json(&text).unwrap();
        assert_eq!(back, config);
    }
}
