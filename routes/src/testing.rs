//! Helpers for tests of this crate and of crates built on it.

use crate::address;
use crate::cidr::AddressSpan;
use crate::cidr::CidrBlock;
use crate::feed::AllocationRecord;

/// A record of `count` addresses starting at the dotted address `start`.
///
/// # Panics
///
/// Panics if `start` is not a valid address.
pub fn record(start: &str, count: u32) -> AllocationRecord {
    AllocationRecord::new(address::parse(start).unwrap(), count)
}

/// The blocks in `a.b.c.d/n` notation.
pub fn strings(blocks: &[CidrBlock]) -> Vec<String> {
    blocks.iter().map(ToString::to_string).collect()
}

/// Sort `spans` and merge the ones that touch or overlap. Empty spans are
/// dropped.
pub fn coalesce<I>(spans: I) -> Vec<AddressSpan>
where
    I: IntoIterator<Item = AddressSpan>,
{
    let mut spans: Vec<AddressSpan> = spans.into_iter().filter(|s| !s.is_empty()).collect();
    spans.sort();

    let mut merged: Vec<AddressSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Assert that every block is aligned, and that the blocks are ascending
/// and pairwise disjoint.
///
/// # Panics
///
/// Panics describing the first offending block.
pub fn assert_well_formed(blocks: &[CidrBlock]) {
    for block in blocks {
        assert!(block.prefix_len() <= 32, "{block} has an invalid prefix");
        assert_eq!(
            u64::from(block.network()) % block.size(),
            0,
            "{block} is not aligned"
        );
    }
    for pair in blocks.windows(2) {
        assert!(
            pair[0].span().end <= pair[1].span().start,
            "{} and {} overlap or are out of order",
            pair[0],
            pair[1]
        );
    }
}
