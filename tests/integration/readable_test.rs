//! Readable streams and cancellation across pipelines.

use crate::common::{fixture_path, generate_lines, temp_file};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tp_error::TpError;
use tp_pipeline::{CancellationToken, Pipeline};
use tp_types::ReadOptions;

#[tokio::test]
async fn test_readable_feeds_second_pipeline() {
    let outcome = Arc::new(Mutex::new(None));
    let readable = Pipeline::from_file(fixture_path("test01.txt"), ReadOptions::default())
        .unwrap()
        .lines()
        .to_readable({
            let outcome = outcome.clone();
            move |error: Option<&TpError>| {
                *outcome.lock().unwrap() = Some(error.map(|e| e.to_string()));
            }
        });

    let groups = Pipeline::from_stream(readable)
        .grouped(4)
        .unwrap()
        .to_vec()
        .await
        .unwrap();

    assert_eq!(
        groups,
        vec![
            vec!["line0", "line1", "line2", "line3"],
            vec!["line4", "line5"],
        ]
    );
    // The driver reports completion before it drops its channel.
    assert_eq!(*outcome.lock().unwrap(), Some(None));
}

#[tokio::test]
async fn test_readable_error_reaches_second_pipeline() {
    let readable = Pipeline::from_file(fixture_path("missing.txt"), ReadOptions::default())
        .unwrap()
        .lines()
        .to_readable(|_: Option<&TpError>| {});

    let result = Pipeline::from_stream(readable).count().await;
    assert!(matches!(result, Err(TpError::Source(_))));
}

#[tokio::test]
async fn test_readable_holds_back_pipeline_until_read() {
    let file = temp_file(generate_lines(100).as_bytes());
    let pulled = Arc::new(AtomicUsize::new(0));
    let mut readable = Pipeline::from_file(file.path().to_str().unwrap(), ReadOptions::default())
        .unwrap()
        .lines()
        .map({
            let pulled = pulled.clone();
            move |line: String| {
                pulled.fetch_add(1, Ordering::SeqCst);
                line
            }
        })
        .to_readable(|_: Option<&TpError>| {});

    // One line waits in the channel, one more waits to be sent.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pulled.load(Ordering::SeqCst), 2);

    assert_eq!(readable.next().await.unwrap().unwrap(), "record-00000");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pulled.load(Ordering::SeqCst), 3);

    assert_eq!(readable.next().await.unwrap().unwrap(), "record-00001");
}

#[tokio::test]
async fn test_cancel_throttled_file_pipeline() {
    let file = temp_file(generate_lines(1_000).as_bytes());
    let token = CancellationToken::new();

    let pipeline = Pipeline::from_file(file.path().to_str().unwrap(), ReadOptions::default())
        .unwrap()
        .lines()
        .throttle(Duration::from_millis(50))
        .with_cancellation(token.clone());
    let handle = tokio::spawn(pipeline.count());

    tokio::time::sleep(Duration::from_millis(120)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(TpError::Cancelled)));
}
