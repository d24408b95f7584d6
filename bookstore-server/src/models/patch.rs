//! Absent vs. null in partial-update bodies
//!
//! `Option<Option<T>>` with [`double_option`]: absent → `None`,
//! `null` → `Some(None)`, value → `Some(Some(v))`.

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including `null`) as `Some(..)`.
///
/// Pair with `#[serde(default)]` so an absent field stays `None`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
