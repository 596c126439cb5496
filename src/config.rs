//! Dump configuration
//!
//! Holds every knob of a dump run, validates them before any network
//! activity, and derives the per-component configurations (HTTP client,
//! query construction, scroll engine) from them.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, VerifyMode};
use crate::query::QueryOptions;
use crate::scroll::{HitFormat, ScrollConfig};
use std::time::Duration;
use url::Url;

/// Port assumed when the base URL doesn't specify one
pub const DEFAULT_PORT: u16 = 9200;

// ============================================================================
// Dump Config
// ============================================================================

/// Complete configuration of a dump run
#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Base URL of the cluster, normalized (explicit port, trailing slash)
    pub base_url: Url,
    /// Index name, comma-separated list or wildcard pattern
    pub target: String,
    /// Comma-separated fields to include, or to exclude when prefixed with `^`
    pub fields: Option<String>,
    /// Lucene query string filter
    pub query_string: Option<String>,
    /// Adaptive throttling factor (0 disables throttling)
    pub throttle: f64,
    /// Maximum number of documents to output (0 = unlimited)
    pub count: u64,
    /// Hits per scroll request
    pub scroll_size: usize,
    /// Output the full hit (metadata + `_source`)
    pub metadata: bool,
    /// Output only hit metadata, without `_source`
    pub metadata_only: bool,
    /// Dump documents in random order
    pub random: bool,
    /// Request gzip-compressed responses
    pub compression: bool,
    /// TLS certificate verification mode
    pub verify: VerifyMode,
    /// Maximum number of slices per index
    pub max_slices: usize,
    /// Server-side scroll context keep-alive
    pub scroll_timeout: Duration,
    /// HTTP client timeout (zero = none)
    pub http_timeout: Duration,
}

impl DumpConfig {
    /// Create a config for the given server and index target, with defaults
    /// for everything else
    pub fn new(base_url: &str, target: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            target: target.into(),
            fields: None,
            query_string: None,
            throttle: 4.0,
            count: 0,
            scroll_size: 1000,
            metadata: false,
            metadata_only: false,
            random: false,
            compression: true,
            verify: VerifyMode::System,
            max_slices: 10,
            scroll_timeout: Duration::from_secs(60),
            http_timeout: Duration::from_secs(60),
        })
    }

    /// Set the fields filter
    #[must_use]
    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Set the query string filter
    #[must_use]
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    /// Set the throttle factor
    #[must_use]
    pub fn with_throttle(mut self, throttle: f64) -> Self {
        self.throttle = throttle;
        self
    }

    /// Set the maximum number of documents
    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Set the scroll page size
    #[must_use]
    pub fn with_scroll_size(mut self, size: usize) -> Self {
        self.scroll_size = size;
        self
    }

    /// Include hit metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    /// Only output hit metadata
    #[must_use]
    pub fn with_metadata_only(mut self, metadata_only: bool) -> Self {
        self.metadata_only = metadata_only;
        self
    }

    /// Randomize document order
    #[must_use]
    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    /// Enable or disable response compression
    #[must_use]
    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Set TLS verification mode
    #[must_use]
    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }

    /// Set the maximum slices per index
    #[must_use]
    pub fn with_max_slices(mut self, slices: usize) -> Self {
        self.max_slices = slices;
        self
    }

    /// Set the scroll context timeout
    #[must_use]
    pub fn with_scroll_timeout(mut self, timeout: Duration) -> Self {
        self.scroll_timeout = timeout;
        self
    }

    /// Set the HTTP client timeout
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Check every setting, reporting all violations at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !self.throttle.is_finite() || self.throttle < 0.0 {
            errors.push("throttle must be >= 0".to_string());
        }
        if self.scroll_size < 1 {
            errors.push("scroll-size must be >= 1".to_string());
        }
        if self.max_slices < 1 {
            errors.push("slices must be >= 1".to_string());
        }
        if self.target.trim().is_empty() {
            errors.push("index target must not be empty".to_string());
        }
        if self.metadata_only && self.fields.as_deref().is_some_and(|f| !f.is_empty()) {
            errors.push("metadata-only and fields are mutually exclusive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors })
        }
    }

    /// How hits are extracted from scroll responses
    pub fn hit_format(&self) -> HitFormat {
        if self.metadata || self.metadata_only {
            HitFormat::Full
        } else {
            HitFormat::Source
        }
    }

    /// HTTP client configuration for this run
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url.clone())
            .compression(self.compression)
            .verify(self.verify.clone());
        if !self.http_timeout.is_zero() {
            builder = builder.timeout(self.http_timeout);
        }
        builder.build()
    }

    /// Query construction options for this run
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            fields: self.fields.clone(),
            query_string: self.query_string.clone(),
            metadata_only: self.metadata_only,
            size: self.scroll_size,
            random: self.random,
        }
    }

    /// Scroll engine configuration for this run
    pub fn scroll_config(&self) -> ScrollConfig {
        ScrollConfig {
            page_size: self.scroll_size,
            scroll_timeout: self.scroll_timeout,
            throttle: self.throttle,
            max_records: self.count,
            hit_format: self.hit_format(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse and normalize the cluster base URL
///
/// A scheme is required. When no port is given, 9200 is assumed. The path
/// always ends with a slash so relative API paths can be appended.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::invalid_value(
            "base-url",
            format!("'{raw}' must be an http(s) URL"),
        ));
    }
    if url.port().is_none() && !has_explicit_port(raw) {
        url.set_port(Some(DEFAULT_PORT))
            .map_err(|()| Error::invalid_value("base-url", "cannot set port"))?;
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// The url crate drops a port equal to the scheme default, so look at the
// authority as written.
fn has_explicit_port(raw: &str) -> bool {
    let Some((_, rest)) = raw.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    match host_port.rsplit_once(':') {
        Some((host, port)) => {
            !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
                && (!host.starts_with('[') || host.ends_with(']'))
        }
        None => false,
    }
}

/// Format a scroll timeout for the `scroll` parameter
///
/// Elasticsearch accepts a single unit with an integer value, so durations
/// are truncated to whole milliseconds below 10 seconds and to whole seconds
/// otherwise.
pub fn format_scroll_timeout(timeout: Duration) -> String {
    if timeout < Duration::from_secs(10) {
        format!("{}ms", timeout.as_millis())
    } else {
        format!("{}s", timeout.as_secs())
    }
}

/// Parse a duration such as `1m`, `30s`, `250ms` or `1h2m3.5s`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(Error::invalid_value("duration", "empty duration"));
    }

    let invalid = || Error::invalid_value("duration", format!("invalid duration '{input}'"));

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| Error::invalid_value("duration", format!("missing unit in '{input}'")))?;
        if number_end == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_end].parse().map_err(|_| invalid())?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_end] {
            "h" => 3_600_000_000_000.0,
            "m" => 60_000_000_000.0,
            "s" => 1_000_000_000.0,
            "ms" => 1_000_000.0,
            "us" | "µs" => 1_000.0,
            "ns" => 1.0,
            _ => return Err(invalid()),
        };
        total += Duration::from_nanos((value * nanos_per_unit).round() as u64);
        rest = &rest[unit_end..];
    }
    Ok(total)
}
