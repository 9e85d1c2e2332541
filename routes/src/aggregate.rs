//! # Range aggregation
//!
//! Turns an ascending stream of [`AllocationRecord`]s into CIDR blocks.
//! There are two modes:
//!
//! - [`Mode::Direct`] emits blocks covering the accepted records
//!   themselves. Each record is held back as a pending span so that an
//!   address-contiguous successor can be folded into it whenever the
//!   combined size is a power of two.
//! - [`Mode::Complement`] emits blocks covering everything *except* the
//!   accepted records. A cursor sweeps the whole address space from
//!   0.0.0.0 to 255.255.255.255 and every gap between accepted records
//!   is flushed as it is closed.
//!
//! In both modes records starting in private space are skipped, and no
//! emitted block ever touches a private block.
//!
//! Every transition is a pure function of the current state and one
//! record, returning the next state and the blocks it emitted. The
//! [`Aggregator`] threads that state through a whole stream.

use std::net::Ipv4Addr;

use crate::address;
use crate::address::ADDRESS_SPACE_SIZE;
use crate::cidr::decompose;
use crate::cidr::AddressSpan;
use crate::cidr::CidrBlock;
use crate::error::Error;
use crate::feed::AllocationRecord;
use crate::private;
use crate::private::ScanPosition;

/// How the accepted records relate to the emitted blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emit blocks covering the accepted records.
    Direct,
    /// Emit blocks covering every public address outside the accepted
    /// records.
    Complement,
}

/// The result of feeding one record to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S> {
    /// The state after the record.
    pub state: S,
    /// Blocks closed by the record, in ascending order.
    pub emitted: Vec<CidrBlock>,
}

impl<S> Transition<S> {
    fn unchanged(state: S) -> Self {
        Self {
            state,
            emitted: Vec::new(),
        }
    }
}

/// State of the direct mode: the span held back for a possible merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeState {
    pending: Option<AddressSpan>,
}

impl MergeState {
    /// The span waiting to be emitted, if any.
    pub fn pending(&self) -> Option<AddressSpan> {
        self.pending
    }

    /// Feed one record.
    pub fn step(self, record: AllocationRecord) -> Result<Transition<Self>, Error> {
        let span = record.span()?;
        if private::classify(record.start).is_private() {
            return Ok(Transition::unchanged(self));
        }

        let mut pending = self.pending;
        if let Some(open) = pending {
            ensure_ascending(record, open.end)?;
        }

        // A record may start in public space and still run into a private
        // block, so only its public parts are considered.
        let mut emitted = Vec::new();
        for part in private::public_parts(span) {
            pending = match pending {
                Some(open)
                    if open.end == part.start
                        && address::is_power_of_two(open.len() + part.len()) =>
                {
                    Some(AddressSpan::new(open.start, part.end))
                }
                Some(open) => {
                    emitted.extend(decompose(open));
                    Some(part)
                }
                None => Some(part),
            };
        }

        Ok(Transition {
            state: Self { pending },
            emitted,
        })
    }

    /// Flush the pending span.
    pub fn finish(self) -> Vec<CidrBlock> {
        self.pending.into_iter().flat_map(decompose).collect()
    }
}

/// State of the complement mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Left edge of the gap that has not been flushed yet. This is the end
    /// of the last accepted record, or 0 before the first one.
    cursor: u64,
    /// Position of the last accepted record relative to the private
    /// blocks.
    position: ScanPosition,
}

impl ScanState {
    /// Left edge of the gap that has not been flushed yet.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Position of the last accepted record relative to the private
    /// blocks.
    pub fn position(&self) -> ScanPosition {
        self.position
    }

    /// Feed one record.
    pub fn step(self, record: AllocationRecord) -> Result<Transition<Self>, Error> {
        let span = record.span()?;
        if private::classify(record.start).is_private() {
            return Ok(Transition::unchanged(self));
        }
        ensure_ascending(record, self.cursor)?;

        let start = u64::from(record.start);
        let position = ScanPosition::of(record.start);
        let mut emitted = Vec::new();

        // Close the gap at each private block the scan stepped over and
        // resume right after it.
        let mut cursor = self.cursor;
        for block in self.position.crossed_to(position) {
            if cursor < block.start {
                emitted.extend(decompose(AddressSpan::new(cursor, block.start)));
            }
            cursor = cursor.max(block.end);
        }

        // Contiguous records leave an empty gap, which emits nothing.
        if cursor < start {
            emitted.extend(decompose(AddressSpan::new(cursor, start)));
        }

        let state = Self {
            cursor: span.end,
            position,
        };
        Ok(Transition { state, emitted })
    }

    /// Flush everything from the cursor to the top of the address space,
    /// skipping the private blocks that are still ahead.
    pub fn finish(self) -> Vec<CidrBlock> {
        let mut emitted = Vec::new();
        let mut cursor = self.cursor;
        for block in self.position.remaining() {
            if cursor < block.start {
                emitted.extend(decompose(AddressSpan::new(cursor, block.start)));
            }
            cursor = cursor.max(block.end);
        }
        if cursor < ADDRESS_SPACE_SIZE {
            emitted.extend(decompose(AddressSpan::new(cursor, ADDRESS_SPACE_SIZE)));
        }
        emitted
    }
}

/// Records must start at or after the end of everything seen so far.
fn ensure_ascending(record: AllocationRecord, open_end: u64) -> Result<(), Error> {
    if u64::from(record.start) >= open_end {
        return Ok(());
    }
    // `open_end` is past the record start, so it is at least 1 and at most
    // 2^32, and the last address fits in a u32.
    let last = (open_end - 1) as u32;
    Err(Error::OutOfOrder {
        start: Ipv4Addr::from(record.start),
        previous_end: Ipv4Addr::from(last),
    })
}

/// Per-run aggregation state for either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// See [`Mode::Direct`].
    Direct(MergeState),
    /// See [`Mode::Complement`].
    Complement(ScanState),
}

impl AggregatorState {
    /// The initial state for `mode`.
    pub fn new(mode: Mode) -> Self {
        match mode {
            Mode::Direct => AggregatorState::Direct(MergeState::default()),
            Mode::Complement => AggregatorState::Complement(ScanState::default()),
        }
    }

    /// Feed one record.
    pub fn step(self, record: AllocationRecord) -> Result<Transition<Self>, Error> {
        match self {
            AggregatorState::Direct(state) => {
                let Transition { state, emitted } = state.step(record)?;
                Ok(Transition {
                    state: AggregatorState::Direct(state),
                    emitted,
                })
            }
            AggregatorState::Complement(state) => {
                let Transition { state, emitted } = state.step(record)?;
                Ok(Transition {
                    state: AggregatorState::Complement(state),
                    emitted,
                })
            }
        }
    }

    /// Flush whatever the state still holds.
    pub fn finish(self) -> Vec<CidrBlock> {
        match self {
            AggregatorState::Direct(state) => state.finish(),
            AggregatorState::Complement(state) => state.finish(),
        }
    }
}

/// Drives an [`AggregatorState`] over a stream of records and collects the
/// emitted blocks.
///
/// The blocks collected before [`Aggregator::finish`] are incomplete: if
/// the stream is abandoned part way, they must be discarded.
#[derive(Debug, Clone)]
pub struct Aggregator {
    state: AggregatorState,
    blocks: Vec<CidrBlock>,
}

impl Aggregator {
    /// Create a new aggregator.
    pub fn new(mode: Mode) -> Self {
        Self {
            state: AggregatorState::new(mode),
            blocks: Vec::new(),
        }
    }

    /// Feed the next record. On error the state is left as it was before
    /// the record.
    pub fn push(&mut self, record: AllocationRecord) -> Result<(), Error> {
        let Transition { state, emitted } = self.state.step(record)?;
        self.state = state;
        self.blocks.extend(emitted);
        Ok(())
    }

    /// Flush the trailing span and return every block.
    pub fn finish(self) -> Vec<CidrBlock> {
        let mut blocks = self.blocks;
        blocks.extend(self.state.finish());
        blocks
    }
}

/// Aggregate a whole stream of records.
pub fn aggregate<I>(mode: Mode, records: I) -> Result<Vec<CidrBlock>, Error>
where
    I: IntoIterator<Item = AllocationRecord>,
{
    let mut aggregator = Aggregator::new(mode);
    for record in records {
        aggregator.push(record)?;
    }
    Ok(aggregator.finish())
}
