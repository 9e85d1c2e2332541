//! Top-level error type for the routes library
//!

use std::net::Ipv4Addr;

/// Errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The address did not have exactly four dot-separated fields.
    #[error("expected 4 dot-separated fields in address {0:?}, got {1}")]
    AddressFieldCount(String, usize),
    /// One of the address fields was empty, too long or not a number.
    #[error("invalid field {1:?} in address {0:?}")]
    AddressField(String, String),
    /// One of the address fields was a number outside of 0..=255.
    #[error("field {1} in address {0:?} is larger than 255")]
    AddressFieldRange(String, u32),
    /// A record line matched the filter but did not have the seven
    /// `|`-separated fields of the delegation format.
    #[error("expected 7 '|'-separated fields in record, got {0}")]
    RecordFieldCount(usize),
    /// The address count of a record was not a positive integer.
    #[error("invalid address count {0:?} in record")]
    RecordCount(String),
    /// The allocation date of a record was not numeric.
    #[error("invalid allocation date {0:?} in record")]
    RecordDate(String),
    /// The status of a record was empty or not lowercase ascii.
    #[error("invalid allocation status {0:?} in record")]
    RecordStatus(String),
    /// The record runs past 255.255.255.255.
    #[error("record starting at {0} with {1} addresses overflows the IPv4 address space")]
    RecordOverflow(Ipv4Addr, u32),
    /// An accepted record started below the span that is still open. The
    /// input stream must be ascending and free of overlaps, so this can
    /// only happen on bad data, and continuing would emit unsound routes.
    #[error("record starting at {start} precedes the end of the previous span at {previous_end}")]
    OutOfOrder {
        /// Start address of the offending record.
        start: Ipv4Addr,
        /// Last address of everything accepted so far.
        previous_end: Ipv4Addr,
    },
}

impl Error {
    /// Whether this error came from decoding a single feed line. Such
    /// errors are recovered by skipping the line.
    pub fn is_decode(&self) -> bool {
        !matches!(self, Error::OutOfOrder { .. })
    }
}
