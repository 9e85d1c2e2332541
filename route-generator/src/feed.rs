//! Streaming access to the delegation feed.
//!
//! The delegation file is several megabytes, so it is never held in
//! memory as a whole. Both sources hand out one line at a time as the
//! bytes arrive.

use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use url::Url;

use crate::config::FeedConfig;
use crate::error::Error;

/// Size of the buffer used when reading a local copy of the feed.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Reassembles lines from a response body that arrives in arbitrary
/// chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
    lines: u64,
}

impl LineSplitter {
    /// Append `bytes` and hand every line they complete to `on_line`.
    pub fn push<F>(&mut self, bytes: &[u8], on_line: &mut F) -> Result<(), Error>
    where
        F: FnMut(&str) -> Result<(), Error>,
    {
        self.pending.extend_from_slice(bytes);

        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = decode_line(&self.pending[consumed..end]);
            self.lines += 1;
            on_line(&line)?;
            consumed = end + 1;
        }
        self.pending.drain(..consumed);

        Ok(())
    }

    /// Hand the final, unterminated line to `on_line`, if there is one,
    /// and return the number of lines seen.
    pub fn finish<F>(mut self, on_line: &mut F) -> Result<u64, Error>
    where
        F: FnMut(&str) -> Result<(), Error>,
    {
        if !self.pending.is_empty() {
            self.lines += 1;
            on_line(&decode_line(&self.pending))?;
        }
        Ok(self.lines)
    }
}

/// The feed is ASCII. Anything else is replaced rather than rejected, and
/// the record decoder then rejects the line.
fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

/// Fetches the delegation feed over HTTP.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: Url,
}

impl FeedClient {
    /// Create a client for the configured feed.
    pub fn new(config: &FeedConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// The URL the feed is fetched from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Download the feed and call `on_line` for every line, in order.
    /// Returns the number of lines read.
    ///
    /// Stops at the first error returned by `on_line`.
    #[tracing::instrument(skip_all, fields(url = %self.url))]
    pub async fn for_each_line<F>(&self, mut on_line: F) -> Result<u64, Error>
    where
        F: FnMut(&str) -> Result<(), Error>,
    {
        tracing::info!("fetching the delegation feed, this may take a few minutes");

        let mut response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(self.url.clone(), status));
        }

        let mut splitter = LineSplitter::default();
        let mut bytes = 0;
        while let Some(chunk) = response.chunk().await? {
            bytes += chunk.len();
            splitter.push(&chunk, &mut on_line)?;
        }
        let lines = splitter.finish(&mut on_line)?;

        tracing::debug!(bytes, lines, "downloaded the delegation feed");
        Ok(lines)
    }
}

/// Where the delegation feed is read from.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// The registry's published file.
    Http(FeedClient),
    /// A local copy of the file.
    File(PathBuf),
}

impl FeedSource {
    /// Call `on_line` for every line of the feed, in order. Returns the
    /// number of lines read.
    pub async fn for_each_line<F>(&self, on_line: F) -> Result<u64, Error>
    where
        F: FnMut(&str) -> Result<(), Error>,
    {
        match self {
            FeedSource::Http(client) => client.for_each_line(on_line).await,
            FeedSource::File(path) => read_file(path, on_line).await,
        }
    }
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
async fn read_file<F>(path: &Path, mut on_line: F) -> Result<u64, Error>
where
    F: FnMut(&str) -> Result<(), Error>,
{
    let read_error = |source: std::io::Error| Error::ReadFeed {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(read_error)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut line = Vec::new();
    let mut lines = 0u64;
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(read_error)?;
        if read == 0 {
            break;
        }
        let bytes = line.strip_suffix(b"\n").unwrap_or(&line);
        lines += 1;
        on_line(&decode_line(bytes))?;
    }

    tracing::debug!(lines, "read the delegation feed");
    Ok(lines)
}
