//! # Delegation feed records
//!
//! Registries publish their allocations as `|`-separated lines:
//!
//! ```text
//! apnic|JP|ipv4|1.0.16.0|4096|20110412|allocated
//! ^^^^^ ^^ ^^^^ ^^^^^^^^ ^^^^ ^^^^^^^^ ^^^^^^^^^
//!   │   │   │      │      │      │        └ status
//!   │   │   │      │      │      └ allocation date
//!   │   │   │      │      └ number of addresses
//!   │   │   │      └ first address
//!   │   │   └ address type
//!   │   └ country code
//!   └ registry
//! ```
//!
//! The file also holds a version header, per-type summary lines, comment
//! lines and IPv6/ASN records, all of which a [`RecordFilter`] ignores.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use crate::address;
use crate::address::ADDRESS_SPACE_SIZE;
use crate::cidr::AddressSpan;
use crate::error::Error;

/// Number of `|`-separated fields in an address record.
const RECORD_FIELDS: usize = 7;

/// The address type this crate handles.
const IPV4: &str = "ipv4";

/// One allocation: `count` addresses starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRecord {
    /// First allocated address.
    pub start: u32,
    /// Number of allocated addresses.
    pub count: u32,
}

impl AllocationRecord {
    /// Create a new record.
    pub fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    /// The addresses covered by the record. Fails if the record runs past
    /// 255.255.255.255.
    pub fn span(&self) -> Result<AddressSpan, Error> {
        let start = u64::from(self.start);
        let end = start + u64::from(self.count);
        if end > ADDRESS_SPACE_SIZE {
            return Err(Error::RecordOverflow(Ipv4Addr::from(self.start), self.count));
        }
        Ok(AddressSpan::new(start, end))
    }
}

/// Selects the IPv4 records of one registry allocated to a set of
/// countries, and decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    registry: String,
    countries: BTreeSet<String>,
}

impl RecordFilter {
    /// Accept records of `registry` whose country code is in `countries`.
    pub fn new<I, S>(registry: impl Into<String>, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registry: registry.into(),
            countries: countries.into_iter().map(Into::into).collect(),
        }
    }

    /// The registry this filter accepts.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Whether records allocated to `country` are accepted.
    pub fn accepts_country(&self, country: &str) -> bool {
        self.countries.contains(country)
    }

    /// Decode one feed line.
    ///
    /// Returns `Ok(None)` for lines this filter does not select, and an
    /// error for selected lines that are malformed. Callers are expected
    /// to skip both.
    pub fn decode(&self, line: &str) -> Result<Option<AllocationRecord>, Error> {
        if line.starts_with('#') {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split('|').collect();
        let selected = fields.len() >= 3
            && fields[0] == self.registry
            && self.accepts_country(fields[1])
            && fields[2] == IPV4;
        if !selected {
            return Ok(None);
        }

        let [_, _, _, start, count, date, status] = fields[..] else {
            return Err(Error::RecordFieldCount(fields.len()));
        };

        let start = address::parse(start)?;
        let count = match count.parse::<u32>() {
            Ok(value) if value > 0 && count.bytes().all(|b| b.is_ascii_digit()) => value,
            _ => return Err(Error::RecordCount(count.to_string())),
        };
        if date.is_empty() || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::RecordDate(date.to_string()));
        }
        if status.is_empty() || !status.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(Error::RecordStatus(status.to_string()));
        }
        let record = AllocationRecord::new(start, count);
        record.span()?;

        Ok(Some(record))
    }
}
