pub mod admin;
pub mod auth;
pub mod company;
pub mod profile;
pub mod trips;
pub mod uploads;
pub mod vehicles;

use serde::{Deserialize, Deserializer};

/// Tells an absent field (`None`) apart from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
