//! File-backed pipelines from chunks to sinks.

use crate::common::{fixture_path, generate_lines, temp_file};
use tp_error::{ErrorKind, SourceError, StageKind, TpError};
use tp_pipeline::{LineDecoding, Pipeline};
use tp_types::{Encoding, PipelineState, ReadOptions};

#[tokio::test]
async fn test_fixture_lines_replace_and_filter() {
    let lines = Pipeline::from_file(fixture_path("test01.txt"), ReadOptions::default())
        .unwrap()
        .lines()
        .map(|line| line.replace("line", "foobar"))
        .filter(|line| line != "foobar0")
        .to_vec()
        .await
        .unwrap();

    assert_eq!(
        lines,
        vec!["foobar1", "foobar2", "foobar3", "foobar4", "foobar5"]
    );
}

#[tokio::test]
async fn test_fixture_line_count() {
    let mut count = 0;
    Pipeline::from_file(fixture_path("test01.txt"), ReadOptions::default())
        .unwrap()
        .lines()
        .foreach(|_| count += 1)
        .await
        .unwrap();

    assert_eq!(count, 6);
}

#[tokio::test]
async fn test_lines_independent_of_buffer_size() {
    let contents = "first\r\nsecond\n\nfourth line is longer\nlast";
    let file = temp_file(contents.as_bytes());
    let path = file.path().to_str().unwrap();

    for buffer_size in 1..=12 {
        let lines = Pipeline::from_file(path, ReadOptions::new().with_buffer_size(buffer_size))
            .unwrap()
            .lines()
            .to_vec()
            .await
            .unwrap();

        assert_eq!(
            lines,
            vec!["first", "second", "", "fourth line is longer", "last"],
            "buffer size {}",
            buffer_size
        );
    }
}

#[tokio::test]
async fn test_large_file_grouped() {
    let file = temp_file(generate_lines(1_003).as_bytes());
    let options = ReadOptions::new().with_buffer_size(100);

    let outcome = Pipeline::from_file(file.path().to_str().unwrap(), options)
        .unwrap()
        .lines()
        .grouped(250)
        .unwrap()
        .map(|group| group.len())
        .run(tp_pipeline::sink::Collect::new())
        .await
        .unwrap();

    assert_eq!(outcome.output, vec![250, 250, 250, 250, 3]);
    assert_eq!(outcome.stats.state, PipelineState::Completed);
    assert_eq!(outcome.stats.elements, 5);
}

#[tokio::test]
async fn test_byte_range_cuts_lines() {
    let file = temp_file(b"line0\nline1\nline2\nline3\n");
    let options = ReadOptions::new()
        .with_start(8)
        .with_end(19)
        .with_buffer_size(5);

    let lines = Pipeline::from_file(file.path().to_str().unwrap(), options)
        .unwrap()
        .lines()
        .to_vec()
        .await
        .unwrap();

    // Bytes 8..=19 are "ne1\nline2\nli"
    assert_eq!(lines, vec!["ne1", "line2", "li"]);
}

#[tokio::test]
async fn test_latin1_file() {
    let file = temp_file(&[b'n', 0xE4, b'\n', b'\xFC', b'b', b'e', b'r']);
    let options = ReadOptions::new()
        .with_encoding(Encoding::Latin1)
        .with_buffer_size(2);

    let lines = Pipeline::from_file(file.path().to_str().unwrap(), options)
        .unwrap()
        .lines_with(LineDecoding::Strict)
        .to_vec()
        .await
        .unwrap();

    assert_eq!(lines, vec!["nä", "über"]);
}

#[tokio::test]
async fn test_strict_decoding_rejects_invalid_utf8() {
    let file = temp_file(&[b'o', b'k', b'\n', 0xC3, 0x28, b'\n']);

    let result = Pipeline::from_file(file.path().to_str().unwrap(), ReadOptions::default())
        .unwrap()
        .lines_with(LineDecoding::Strict)
        .to_vec()
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.stage_kind(), Some(StageKind::Lines));
    assert_eq!(error.kind(), ErrorKind::Stage);
}

#[tokio::test]
async fn test_error_midway_keeps_earlier_effects() {
    let file = temp_file(generate_lines(10).as_bytes());
    let mut delivered = Vec::new();

    let result = Pipeline::from_file(file.path().to_str().unwrap(), ReadOptions::default())
        .unwrap()
        .lines()
        .try_map(|line| {
            if line.ends_with("00002") {
                anyhow::bail!("refusing {}", line);
            }
            Ok(line)
        })
        .foreach(|line| delivered.push(line))
        .await;

    assert!(matches!(result, Err(TpError::Stage { .. })));
    assert_eq!(delivered, vec!["record-00000", "record-00001"]);
}

#[tokio::test]
async fn test_missing_file() {
    let result = Pipeline::from_file(fixture_path("does-not-exist.txt"), ReadOptions::default())
        .unwrap()
        .lines()
        .count()
        .await;

    assert!(matches!(
        result,
        Err(TpError::Source(SourceError::NotFound(_)))
    ));
}
