//! Document id hashing

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::{xxh3_128, xxh3_64};

/// Hash used to derive a document id from a record's canonical print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// 128-bit content hash, rendered as 32 lowercase hex digits
    #[default]
    XxHash128,
    /// 64-bit hash, rendered in decimal
    XxHash64,
}

impl HashAlgorithm {
    /// Document id for `text`
    pub fn id(&self, text: &str) -> String {
        match self {
            HashAlgorithm::XxHash128 => format!("{:032x}", xxh3_128(text.as_bytes())),
            HashAlgorithm::XxHash64 => xxh3_64(text.as_bytes()).to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::XxHash128 => "xxhash128",
            HashAlgorithm::XxHash64 => "xxhash64",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = SchemaError;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xxhash128" | "xxh3_128" => Ok(HashAlgorithm::XxHash128),
            "xxhash64" | "xxhash" | "xxh3_64" => Ok(HashAlgorithm::XxHash64),
            _ => Err(SchemaError::UnknownHashAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_formats() {
        let hex = HashAlgorithm::XxHash128.id("null:host1:cpu:null:null");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let decimal = HashAlgorithm::XxHash64.id("null:host1:cpu:null:null");
        assert!(decimal.parse::<u64>().is_ok());
    }

    #[test]
    fn test_id_is_deterministic() {
        for algorithm in [HashAlgorithm::XxHash128, HashAlgorithm::XxHash64] {
            assert_eq!(algorithm.id("a:b:c"), algorithm.id("a:b:c"));
            assert_ne!(algorithm.id("a:b:c"), algorithm.id("a:b:d"));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("XXHASH128".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::XxHash128);
        assert_eq!("xxhash".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::XxHash64);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(SchemaError::UnknownHashAlgorithm(s)) if s == "md5"
        ));
    }
}
