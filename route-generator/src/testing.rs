//! Helpers for tests.

use crate::config::Settings;

/// The path to the configuration file shipped with the crate, relative to
/// the crate root, which is where `cargo test` runs.
pub const DEFAULT_CONFIG_PATH: Option<&str> = Some("./src/config/default");

/// A small delegation file covering the cases the generator has to handle.
pub const SAMPLE_FEED: &str = "\
2|apnic|20240101|6|19830613|20231229|+1000
apnic|*|ipv4|*|5|summary
apnic|AU|ipv4|1.0.0.0|256|20110811|assigned
apnic|CN|ipv4|1.0.1.0|256|20110414|allocated
apnic|CN|ipv4|1.0.2.0|512|20110414|allocated
apnic|JP|ipv4|1.0.16.0|4096|20110412|allocated
apnic|CN|ipv4|1.0.32.0|oops|20110414|allocated
apnic|JP|ipv6|2001:200::|35|19990813|allocated
";

impl Settings {
    /// Create a new `Settings` instance from the default configuration file.
    /// This is useful for testing.
    pub fn new_from_default_config() -> Result<Self, config::ConfigError> {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}
