//! # Private address space
//!
//! The three RFC 1918 blocks are never routed. The aggregator skips
//! records that start inside them and splits every emitted span around
//! them.

use crate::cidr::AddressSpan;

/// One of the RFC 1918 private blocks, as a half-open range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivateBlock {
    /// First address of the block.
    pub start: u64,
    /// One past the last address of the block.
    pub end: u64,
}

impl PrivateBlock {
    /// Whether `address` lies in the block.
    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address < self.end
    }
}

/// 10.0.0.0/8
pub const PRIVATE_10: PrivateBlock = PrivateBlock {
    start: 0x0A00_0000,
    end: 0x0B00_0000,
};
/// 172.16.0.0/12
pub const PRIVATE_172: PrivateBlock = PrivateBlock {
    start: 0xAC10_0000,
    end: 0xAC20_0000,
};
/// 192.168.0.0/16
pub const PRIVATE_192: PrivateBlock = PrivateBlock {
    start: 0xC0A8_0000,
    end: 0xC0A9_0000,
};

/// The private blocks in ascending address order.
pub const PRIVATE_BLOCKS: [PrivateBlock; 3] = [PRIVATE_10, PRIVATE_172, PRIVATE_192];

/// Which private block, if any, an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    /// Routable address.
    Public,
    /// 10.0.0.0/8
    Private10,
    /// 172.16.0.0/12
    Private172,
    /// 192.168.0.0/16
    Private192,
}

impl AddressClass {
    /// Whether this is one of the private classes.
    pub fn is_private(&self) -> bool {
        !matches!(self, AddressClass::Public)
    }
}

/// Classify an address.
pub fn classify(address: u32) -> AddressClass {
    let address = u64::from(address);
    if PRIVATE_10.contains(address) {
        AddressClass::Private10
    } else if PRIVATE_172.contains(address) {
        AddressClass::Private172
    } else if PRIVATE_192.contains(address) {
        AddressClass::Private192
    } else {
        AddressClass::Public
    }
}

/// Where a public address sits relative to the private blocks. An ascending
/// scan only ever moves forward through these states, and every forward
/// move crosses one private block per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanPosition {
    /// Below 10.0.0.0/8.
    #[default]
    BeforeFirstBlock,
    /// Between 10.0.0.0/8 and 172.16.0.0/12.
    BetweenFirstAndSecond,
    /// Between 172.16.0.0/12 and 192.168.0.0/16.
    BetweenSecondAndThird,
    /// Above 192.168.0.0/16.
    AfterThirdBlock,
}

impl ScanPosition {
    const ALL: [ScanPosition; 4] = [
        ScanPosition::BeforeFirstBlock,
        ScanPosition::BetweenFirstAndSecond,
        ScanPosition::BetweenSecondAndThird,
        ScanPosition::AfterThirdBlock,
    ];

    /// The position of `address`, counting the private blocks that lie
    /// entirely below it. An address inside a private block is placed
    /// before that block.
    pub fn of(address: u32) -> Self {
        let address = u64::from(address);
        let below = PRIVATE_BLOCKS
            .iter()
            .take_while(|block| block.end <= address)
            .count();
        Self::ALL[below]
    }

    /// The private blocks crossed when a scan moves from `self` to `next`,
    /// in ascending order. Empty unless `next` is past `self`.
    pub fn crossed_to(self, next: ScanPosition) -> &'static [PrivateBlock] {
        let (from, to) = (self as usize, next as usize);
        if to <= from {
            return &[];
        }
        &PRIVATE_BLOCKS[from..to]
    }

    /// The private blocks not yet crossed from this position.
    pub fn remaining(self) -> &'static [PrivateBlock] {
        &PRIVATE_BLOCKS[self as usize..]
    }
}

/// Split `span` around the private blocks, returning the public parts in
/// ascending order. Empty parts are dropped.
pub fn public_parts(span: AddressSpan) -> Vec<AddressSpan> {
    let mut parts = Vec::new();
    let mut start = span.start;
    for block in &PRIVATE_BLOCKS {
        if block.end <= start {
            continue;
        }
        if span.end <= block.start {
            break;
        }
        if start < block.start {
            parts.push(AddressSpan::new(start, block.start));
        }
        start = block.end;
    }
    if start < span.end {
        parts.push(AddressSpan::new(start, span.end));
    }
    parts
}
