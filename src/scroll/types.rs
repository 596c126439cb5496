//! Scroll types
//!
//! Slice descriptors, engine configuration, page decoding and slice
//! outcomes.

use crate::config::format_scroll_timeout;
use crate::error::{Error, Result};
use crate::types::Record;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::time::Duration;

// ============================================================================
// Slice Descriptor
// ============================================================================

/// One parallel partition of one index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceDescriptor {
    /// Concrete index name
    pub index: String,
    /// Slice id, in `0..total`
    pub slice: usize,
    /// Number of slices of this index
    pub total: usize,
}

impl SliceDescriptor {
    /// Create a slice descriptor
    pub fn new(index: impl Into<String>, slice: usize, total: usize) -> Self {
        Self {
            index: index.into(),
            slice,
            total,
        }
    }

    /// Whether the open request needs a `slice` clause
    pub fn is_sliced(&self) -> bool {
        self.total > 1
    }
}

impl fmt::Display for SliceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}/{}]", self.index, self.slice, self.total)
    }
}

// ============================================================================
// Scroll Config
// ============================================================================

/// Configuration of the scroll engine
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    /// Hits per page; a shorter page ends the slice
    pub page_size: usize,
    /// Server-side keep-alive of each cursor
    pub scroll_timeout: Duration,
    /// Adaptive throttling factor (<= 0 disables)
    pub throttle: f64,
    /// Stop once this many records were retrieved (0 = unlimited)
    pub max_records: u64,
    /// How hits are extracted from responses
    pub hit_format: HitFormat,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            scroll_timeout: Duration::from_secs(60),
            throttle: 4.0,
            max_records: 0,
            hit_format: HitFormat::Source,
        }
    }
}

impl ScrollConfig {
    /// Value of the `scroll` parameter
    pub fn scroll_param(&self) -> String {
        format_scroll_timeout(self.scroll_timeout)
    }
}

// ============================================================================
// Page decoding
// ============================================================================

/// Which part of each hit becomes a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitFormat {
    /// Only the `_source` document
    #[default]
    Source,
    /// The whole hit, metadata included
    Full,
}

/// One decoded scroll response
#[derive(Debug, Clone, Default)]
pub struct ScrollPage {
    /// Hit payloads in response order
    pub records: Vec<Record>,
    /// Total hits of the slice's index
    pub total_hits: u64,
    /// Cursor token to continue with
    pub scroll_id: Option<String>,
}

#[derive(Deserialize)]
struct ScrollResponse<H> {
    hits: Hits<H>,
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
}

#[derive(Deserialize)]
struct Hits<H> {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default = "Vec::new")]
    hits: Vec<H>,
}

// Clusters before 7.0 report a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            Self::Object { value } | Self::Count(value) => *value,
        }
    }
}

#[derive(Deserialize)]
struct SourceHit {
    #[serde(rename = "_source", default)]
    source: Option<Box<RawValue>>,
}

const NULL_RECORD: &[u8] = b"null";

impl HitFormat {
    /// Decode a scroll response body
    pub fn decode(self, body: &[u8]) -> Result<ScrollPage> {
        match self {
            Self::Full => {
                let resp: ScrollResponse<Box<RawValue>> = parse(body)?;
                let records = resp.hits.hits.iter().map(|hit| raw_record(hit)).collect();
                Ok(page(records, resp.hits.total, resp.scroll_id))
            }
            Self::Source => {
                let resp: ScrollResponse<SourceHit> = parse(body)?;
                let records = resp
                    .hits
                    .hits
                    .iter()
                    .map(|hit| match &hit.source {
                        Some(source) => raw_record(source),
                        None => Record::from_static(NULL_RECORD),
                    })
                    .collect();
                Ok(page(records, resp.hits.total, resp.scroll_id))
            }
        }
    }
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("Failed to parse scroll response: {e}")))
}

fn raw_record(raw: &RawValue) -> Record {
    Record::copy_from_slice(raw.get().as_bytes())
}

fn page(records: Vec<Record>, total: Option<TotalHits>, scroll_id: Option<String>) -> ScrollPage {
    ScrollPage {
        records,
        total_hits: total.as_ref().map_or(0, TotalHits::value),
        scroll_id: scroll_id.filter(|id| !id.is_empty()),
    }
}

// ============================================================================
// Slice Outcome
// ============================================================================

/// How a slice run ended
#[derive(Debug)]
pub enum SliceOutcome {
    /// The last page was partial; every hit was delivered
    Exhausted,
    /// The shared record limit was reached
    LimitReached,
    /// The run's cancellation signal fired
    Cancelled,
    /// A request, decode or hand-off failed
    Failed(Error),
}

impl SliceOutcome {
    /// Classify an error that ended a slice
    pub fn from_error(descriptor: &SliceDescriptor, error: Error) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Failed(Error::slice(&descriptor.index, descriptor.slice, error))
        }
    }
}
