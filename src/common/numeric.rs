//! Lenient integer decoding for ledger JSON
//!
//! The fullnode renders `u64` and wider Move integers as JSON strings while
//! `u8`/`u16`/`u32` arrive as plain numbers. Payload fields accept either.

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn into_i128(self) -> Result<i128, String> {
        match self {
            NumberOrString::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(v as i128)
                } else if let Some(v) = n.as_u64() {
                    Ok(v as i128)
                } else {
                    Err(format!("non-integer number {}", n))
                }
            }
            NumberOrString::Text(s) => s
                .trim()
                .parse::<i128>()
                .map_err(|e| format!("invalid integer '{}': {}", s, e)),
        }
    }
}

/// Deserialize an unsigned 64-bit value from a number or a decimal string.
pub fn u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = NumberOrString::deserialize(deserializer)?;
    let value = raw.into_i128().map_err(de::Error::custom)?;
    u64::try_from(value).map_err(|_| de::Error::custom(format!("{} out of range for u64", value)))
}

/// Deserialize a signed value from a number or a decimal string.
pub fn i128_lenient<'de, D>(deserializer: D) -> Result<i128, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = NumberOrString::deserialize(deserializer)?;
    raw.into_i128().map_err(de::Error::custom)
}

/// Optional variant of [`u64_lenient`]; `null` maps to `None`.
pub fn opt_u64_lenient<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => {
            let value = raw.into_i128().map_err(de::Error::custom)?;
            u64::try_from(value)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("{} out of range for u64", value)))
        }
    }
}
