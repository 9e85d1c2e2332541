//! Line-driven route building: decode feed lines, aggregate the selected
//! records and collect the resulting blocks.

use crate::aggregate::Aggregator;
use crate::cidr::CidrBlock;
use crate::error::Error;
use crate::feed::RecordFilter;
use crate::region::Region;

/// Counters describing one run over a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Lines read from the feed.
    pub lines: u64,
    /// Records selected by the region filter and fed to the aggregator.
    pub records: u64,
    /// Selected lines that could not be decoded and were skipped.
    pub malformed: u64,
}

/// The outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    /// The region the blocks cover.
    pub region: Region,
    /// Ascending, disjoint, aligned blocks.
    pub blocks: Vec<CidrBlock>,
    /// Counters for the run.
    pub stats: Stats,
}

/// Consumes feed lines one at a time.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    region: Region,
    filter: RecordFilter,
    aggregator: Aggregator,
    stats: Stats,
}

impl RouteBuilder {
    /// Build routes for `region` from the records of `registry`.
    pub fn new(region: Region, registry: &str) -> Self {
        Self {
            region,
            filter: region.record_filter(registry),
            aggregator: Aggregator::new(region.mode()),
            stats: Stats::default(),
        }
    }

    /// Feed the next line. Malformed records are logged and skipped; the
    /// only error returned is an out-of-order record, after which the run
    /// must be abandoned.
    pub fn push_line(&mut self, line: &str) -> Result<(), Error> {
        self.stats.lines += 1;
        match self.filter.decode(line) {
            Ok(Some(record)) => {
                self.stats.records += 1;
                self.aggregator.push(record)
            }
            Ok(None) => Ok(()),
            Err(error) => {
                self.stats.malformed += 1;
                tracing::debug!(%error, line, "skipping malformed record");
                Ok(())
            }
        }
    }

    /// Flush the aggregator and return the routes.
    pub fn finish(self) -> Routes {
        let blocks = self.aggregator.finish();
        tracing::info!(
            region = %self.region,
            lines = self.stats.lines,
            records = self.stats.records,
            malformed = self.stats.malformed,
            blocks = blocks.len(),
            "aggregated the allocation feed"
        );
        Routes {
            region: self.region,
            blocks,
            stats: self.stats,
        }
    }
}

/// Build routes from an in-memory sequence of lines.
pub fn build_routes<'a, I>(region: Region, registry: &str, lines: I) -> Result<Routes, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut builder = RouteBuilder::new(region, registry);
    for line in lines {
        builder.push_line(line)?;
    }
    Ok(builder.finish())
}
