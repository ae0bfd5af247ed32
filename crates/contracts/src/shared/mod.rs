pub mod geo;
pub mod lookup;

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` the same as a missing key: empty collection.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
