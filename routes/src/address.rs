//! # IPv4 address codec
//!
//! Conversions between dotted-decimal strings and the `u32` form used by
//! the aggregator, plus the table of CIDR block sizes.
//!
//! Block sizes are held as `u64` because the table runs from 2^0 up to
//! 2^32, so that a span ending at the top of the space and a `/0` block
//! are both representable.

use std::net::Ipv4Addr;

use crate::error::Error;

/// Number of addresses in the IPv4 address space.
pub const ADDRESS_SPACE_SIZE: u64 = 1 << 32;

/// Maximum number of characters in a single dotted-decimal field.
const MAX_FIELD_LEN: usize = 3;

/// Every CIDR block size, 2^0 through 2^32, in ascending order.
pub const CIDR_SIZES: [u64; 33] = cidr_sizes();

const fn cidr_sizes() -> [u64; 33] {
    let mut sizes = [0u64; 33];
    let mut i = 0;
    while i < sizes.len() {
        sizes[i] = 1 << i;
        i += 1;
    }
    sizes
}

/// Parse a dotted-decimal IPv4 address into its `u32` form.
///
/// The address must have exactly four fields of one to three ascii digits,
/// each no larger than 255. Whitespace is not trimmed.
pub fn parse(address: &str) -> Result<u32, Error> {
    let fields: Vec<&str> = address.split('.').collect();
    if fields.len() != 4 {
        return Err(Error::AddressFieldCount(address.to_string(), fields.len()));
    }

    let mut value: u32 = 0;
    for field in fields {
        let octet = parse_field(address, field)?;
        value = (value << 8) | octet;
    }
    Ok(value)
}

fn parse_field(address: &str, field: &str) -> Result<u32, Error> {
    let is_digits = !field.is_empty()
        && field.len() <= MAX_FIELD_LEN
        && field.bytes().all(|b| b.is_ascii_digit());
    if !is_digits {
        return Err(Error::AddressField(address.to_string(), field.to_string()));
    }

    // At most three ascii digits, so this cannot fail or overflow.
    let octet = field
        .bytes()
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
    if octet > u32::from(u8::MAX) {
        return Err(Error::AddressFieldRange(address.to_string(), octet));
    }
    Ok(octet)
}

/// Format a `u32` address in dotted-decimal notation.
pub fn format(address: u32) -> String {
    Ipv4Addr::from(address).to_string()
}

/// Whether `count` addresses form a CIDR block, i.e. whether it is one of
/// the [`CIDR_SIZES`]. Zero is an empty span, not a block.
pub fn is_power_of_two(count: u64) -> bool {
    CIDR_SIZES.binary_search(&count).is_ok()
}

/// The largest CIDR block size that does not exceed `count`, or zero when
/// `count` is zero.
pub fn largest_power_of_two_not_exceeding(count: u64) -> u64 {
    match CIDR_SIZES.partition_point(|&size| size <= count) {
        0 => 0,
        n => CIDR_SIZES[n - 1],
    }
}

/// The prefix length of a block holding `size` addresses. `size` must be
/// one of the [`CIDR_SIZES`].
pub fn prefix_len_for(size: u64) -> u8 {
    debug_assert!(is_power_of_two(size));
    (32 - size.trailing_zeros()) as u8
}
