//! Deserializers for the feed settings. Both values usually arrive as
//! strings from the environment, so they are parsed here rather than
//! relying on serde's struct representations.

use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;
use url::Url;

/// The feed URL, from a string.
pub fn feed_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer)?
        .parse()
        .map_err(serde::de::Error::custom)
}

/// A timeout given as a whole number of seconds.
pub fn timeout_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
