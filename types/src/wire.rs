//! Decoding helpers for service payloads.

use serde::{Deserialize, Deserializer};

/// Decode an optional field where the service may send an explicit `null`.
///
/// Pair with `#[serde(default)]` so a missing key and a `null` both become
/// `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
