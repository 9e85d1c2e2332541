//! CIDR blocks, address spans and the decomposition of one into the other.

use std::fmt;
use std::net::Ipv4Addr;

use crate::address;
use crate::address::ADDRESS_SPACE_SIZE;

/// A half-open range of addresses `[start, end)`.
///
/// Both bounds are `u64` so that a span can end at 2^32, one past
/// 255.255.255.255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressSpan {
    /// First address in the span.
    pub start: u64,
    /// One past the last address in the span.
    pub end: u64,
}

impl AddressSpan {
    /// Create a new span. `start` must not exceed `end`, and `end` must
    /// not exceed 2^32.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end && end <= ADDRESS_SPACE_SIZE);
        Self { start, end }
    }

    /// The span holding `count` addresses from `start`.
    pub fn from_count(start: u32, count: u32) -> Self {
        let start = u64::from(start);
        Self::new(start, start + u64::from(count))
    }

    /// Number of addresses in the span.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the span holds no addresses.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A power-of-two sized, aligned block of addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CidrBlock {
    network: u32,
    prefix_len: u8,
}

impl CidrBlock {
    /// Create a block, returning `None` if the prefix length is larger
    /// than 32 or the network address has host bits set.
    pub fn new(network: u32, prefix_len: u8) -> Option<Self> {
        if prefix_len > 32 {
            return None;
        }
        let block = Self {
            network,
            prefix_len,
        };
        (u64::from(network) % block.size() == 0).then_some(block)
    }

    /// The network address as a `u32`.
    pub fn network(&self) -> u32 {
        self.network
    }

    /// The network address.
    pub fn network_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    /// The prefix length, between 0 and 32.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// The netmask, e.g. 255.255.255.0 for a `/24`.
    pub fn netmask(&self) -> Ipv4Addr {
        let mask = u32::MAX
            .checked_shl(u32::from(32 - self.prefix_len))
            .unwrap_or(0);
        Ipv4Addr::from(mask)
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1 << (32 - self.prefix_len)
    }

    /// The addresses covered by the block.
    pub fn span(&self) -> AddressSpan {
        let start = u64::from(self.network);
        AddressSpan::new(start, start + self.size())
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_addr(), self.prefix_len)
    }
}

/// Split `span` into the fewest aligned CIDR blocks that cover it exactly,
/// in ascending address order.
///
/// Each step takes the largest block that both fits in what is left of the
/// span and is aligned at the current address. When the span start is
/// already aligned to every block this picks, this is the same as taking
/// the largest power of two that fits.
pub fn decompose(span: AddressSpan) -> Decompose {
    Decompose {
        cursor: span.start,
        end: span.end,
    }
}

/// Iterator returned by [`decompose`].
#[derive(Debug, Clone)]
pub struct Decompose {
    cursor: u64,
    end: u64,
}

impl Iterator for Decompose {
    type Item = CidrBlock;

    fn next(&mut self) -> Option<CidrBlock> {
        if self.cursor >= self.end {
            return None;
        }

        let fits = address::largest_power_of_two_not_exceeding(self.end - self.cursor);
        let size = fits.min(alignment(self.cursor));
        let block = CidrBlock {
            // The cursor is below `end`, so it is a valid u32 address.
            network: self.cursor as u32,
            prefix_len: address::prefix_len_for(size),
        };
        self.cursor += size;
        Some(block)
    }
}

/// The largest block size that `address` is aligned to.
fn alignment(address: u64) -> u64 {
    match address {
        0 => ADDRESS_SPACE_SIZE,
        _ => 1 << address.trailing_zeros(),
    }
}
