//! Target regions and the records they select.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::aggregate::Mode;
use crate::feed::RecordFilter;

/// Asian countries and territories served by APNIC, apart from mainland
/// China.
#[rustfmt::skip]
const ASIA: &[&str] = &[
    "MN", "KP", "KR", "JP", "VN", "LA", "KH", "TH", "MM", "MY",
    "SG", "ID", "BN", "PH", "TL", "IN", "BD", "BT", "NP", "PK",
    "LK", "MV", "SA", "AE", "TR", "LB", "IQ", "IR", "AF", "TW",
];

/// Mainland China.
const CHINA: &[&str] = &["CN"];

/// The region whose addresses the generated routes cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// Everything outside Asia, computed as the complement of the Asian
    /// allocations (China included).
    #[default]
    NotAsia,
    /// Asian allocations, China excluded.
    Asia,
    /// Chinese allocations.
    China,
}

impl Region {
    /// Every region, in the order they are listed to users.
    pub const ALL: [Region; 3] = [Region::NotAsia, Region::Asia, Region::China];

    /// The country codes whose records this region selects.
    pub fn countries(&self) -> Vec<&'static str> {
        match self {
            Region::NotAsia => ASIA.iter().chain(CHINA).copied().collect(),
            Region::Asia => ASIA.to_vec(),
            Region::China => CHINA.to_vec(),
        }
    }

    /// Whether the selected records are the region itself or what the
    /// region excludes.
    pub fn mode(&self) -> Mode {
        match self {
            Region::NotAsia => Mode::Complement,
            Region::Asia | Region::China => Mode::Direct,
        }
    }

    /// A filter selecting this region's records from `registry`.
    pub fn record_filter(&self, registry: &str) -> RecordFilter {
        RecordFilter::new(registry, self.countries())
    }

    /// The name used on the command line and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NotAsia => "not-asia",
            Region::Asia => "asia",
            Region::China => "china",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown region name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region {0:?}, expected one of not-asia, asia, china")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}
