//! 128-bit derived data keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vellum_core::hash::{stable_hash128, stable_hash128_parts};

/// Length of the textual form of a key.
pub const KEY_HEX_LEN: usize = 32;

/// Permanent name of one cache blob.
///
/// The textual form is 32 lowercase hex characters (high half first). It is both the
/// backing file name and the serialized form of a reference to the blob. The all-zero
/// key is invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivedDataKey {
    high: u64,
    low: u64,
}

impl DerivedDataKey {
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// The invalid (all-zero) key.
    pub const fn invalid() -> Self {
        Self { high: 0, low: 0 }
    }

    /// Key derived from the content itself.
    pub fn from_content(bytes: &[u8]) -> Self {
        let (high, low) = stable_hash128(bytes);
        Self::new(high, low).or_nonzero()
    }

    /// Key derived from a namespace and a discriminator, e.g. `("mesh.vertices", path)`.
    ///
    /// Stable across processes, so the same asset always finds its blobs again.
    pub fn derive(namespace: &str, discriminator: impl AsRef<[u8]>) -> Self {
        let (high, low) = stable_hash128_parts(&[namespace.as_bytes(), discriminator.as_ref()]);
        Self::new(high, low).or_nonzero()
    }

    fn or_nonzero(self) -> Self {
        if self.is_valid() { self } else { Self::new(0, 1) }
    }

    pub const fn high(&self) -> u64 {
        self.high
    }

    pub const fn low(&self) -> u64 {
        self.low
    }

    pub const fn is_valid(&self) -> bool {
        self.high != 0 || self.low != 0
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DerivedDataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

/// Error returned when parsing a key from text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError {
    input: String,
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid derived data key '{}': expected {} hex characters",
            self.input, KEY_HEX_LEN
        )
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for DerivedDataKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseKeyError {
            input: s.to_string(),
        };
        if s.len() != KEY_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let high = u64::from_str_radix(&s[..16], 16).map_err(|_| err())?;
        let low = u64::from_str_radix(&s[16..], 16).map_err(|_| err())?;
        Ok(Self::new(high, low))
    }
}

impl Serialize for DerivedDataKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DerivedDataKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
