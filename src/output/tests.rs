//! Tests for the output module

use super::*;
use crate::error::Error;
use crate::scroll::ScrollCounters;
use crate::types::Record;
use pretty_assertions::assert_eq;
use std::borrow::Cow;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use test_case::test_case;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Compaction
// ============================================================================

#[test]
fn test_compact_passes_single_line_through() {
    let record = br#"{"id": 1, "name": "test"}"#;
    assert!(matches!(compact_record(record).unwrap(), Cow::Borrowed(_)));
}

#[test_case("{\n  \"id\": 1,\n  \"name\": \"test\"\n}", r#"{"id":1,"name":"test"}"# ; "pretty printed")]
#[test_case("{\n\"id\":\n1\n}", r#"{"id":1}"# ; "newlines between tokens")]
#[test_case("{\r\n\t\"a\" : [1, 2]\r\n}", r#"{"a":[1,2]}"# ; "crlf and tabs")]
#[test_case("{\n\"msg\": \"two  spaces\\n\"\n}", r#"{"msg":"two  spaces\n"}"# ; "whitespace inside strings kept")]
#[test_case("{\n\"q\": \"say \\\"hi there\\\"\"\n}", r#"{"q":"say \"hi there\""}"# ; "escaped quotes")]
#[test_case("{\n\"p\": \"C:\\\\ dir\"\n}", r#"{"p":"C:\\ dir"}"# ; "escaped backslash before space")]
fn test_compact_multi_line(input: &str, expected: &str) {
    let compacted = compact_record(input.as_bytes()).unwrap();
    assert_eq!(std::str::from_utf8(&compacted).unwrap(), expected);
}

#[test]
fn test_compact_rejects_invalid_json() {
    let result = compact_record(b"{\n\"id\": }");
    assert!(matches!(result, Err(Error::Decode { .. })));
}

// ============================================================================
// Writer
// ============================================================================

async fn write_all(records: &[&str], max_records: u64, cancel: &CancellationToken) -> (String, u64, u64) {
    let counters = Arc::new(ScrollCounters::new(1));
    let (tx, rx) = mpsc::channel(records.len().max(1));
    for record in records {
        tx.send(Record::copy_from_slice(record.as_bytes())).await.unwrap();
    }
    drop(tx);

    let mut out = Vec::new();
    let written = JsonlWriter::new(&mut out, Arc::clone(&counters), max_records)
        .run(rx, cancel)
        .await
        .unwrap();
    (String::from_utf8(out).unwrap(), written, counters.emitted())
}

#[tokio::test]
async fn test_writes_one_record_per_line() {
    let (out, written, emitted) = write_all(
        &[r#"{"id":1}"#, "{\n  \"id\": 2\n}", r#"{"id":3}"#],
        0,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(out, "{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n");
    assert_eq!(written, 3);
    assert_eq!(emitted, 3);
}

#[tokio::test]
async fn test_stops_at_limit_but_drains() {
    let (out, written, emitted) = write_all(
        &[r#"{"id":1}"#, r#"{"id":2}"#, r#"{"id":3}"#, r#"{"id":4}"#],
        2,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(out.lines().count(), 2);
    assert_eq!(written, 2);
    assert_eq!(emitted, 2);
}

#[tokio::test]
async fn test_discards_after_cancel() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (out, written, _) = write_all(&[r#"{"id":1}"#, r#"{"id":2}"#], 0, &cancel).await;

    assert!(out.is_empty());
    assert_eq!(written, 0);
}

#[tokio::test]
async fn test_invalid_multi_line_record_is_fatal() {
    let counters = Arc::new(ScrollCounters::new(1));
    let (tx, rx) = mpsc::channel(1);
    tx.send(Record::from_static(b"{\n\"broken\"")).await.unwrap();
    drop(tx);

    let mut out = Vec::new();
    let result = JsonlWriter::new(&mut out, counters, 0)
        .run(rx, &CancellationToken::new())
        .await;
    assert!(result.is_err());
}

struct FailingOutput;

impl AsyncWrite for FailingOutput {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_output_failure_is_fatal() {
    let counters = Arc::new(ScrollCounters::new(1));
    let (tx, rx) = mpsc::channel(1);
    tx.send(Record::from_static(b"{}")).await.unwrap();
    drop(tx);

    let result = JsonlWriter::new(FailingOutput, counters, 0)
        .run(rx, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(Error::Io(_))));
}

// ============================================================================
// Progress
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_progress_reporter_stops() {
    let counters = Arc::new(ScrollCounters::new(1));
    let reporter = ProgressReporter::spawn(Arc::clone(&counters), 0, PROGRESS_INTERVAL);

    counters.report_total(10);
    counters.add_emitted(5);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    tokio::time::timeout(Duration::from_secs(1), reporter.stop())
        .await
        .unwrap();
}
