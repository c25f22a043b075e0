//! Integration tests for background pipeline execution with Tokio.

#![cfg(feature = "async")]

use arcanon::async_pipeline::{ProgressEvent, run_async, spawn};
use arcanon::{PipelineOptions, RedactConfig, Stage};

mod common;

#[tokio::test]
async fn test_spawn_streams_events_in_order() {
    let (dir, archive) = common::zip_fixture("sample.zip", common::SAMPLE_ENTRIES);
    let config = RedactConfig::new("192.168.0.1", "NewComputerName", "NewUserName", &archive);
    let options = PipelineOptions::new().output_dir(dir.path().join("out"));

    let (handle, mut events) = spawn(config, options);

    let mut stages = Vec::new();
    let mut percents = Vec::new();
    let mut finished = None;
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::Stage(stage) => stages.push(stage),
            ProgressEvent::Percent(p) => percents.push(p),
            ProgressEvent::Finished(outcome) => finished = Some(outcome),
            _ => {}
        }
    }

    let report = handle.await.unwrap().unwrap();
    assert_eq!(
        stages,
        vec![Stage::Extracting, Stage::Rewriting, Stage::Repacking, Stage::Done]
    );
    assert_eq!(percents, vec![50, 100]);
    assert_eq!(finished, Some(Ok(report.output_path.clone())));
    assert_eq!(common::read_zip(&report.output_path).len(), 2);
}

#[tokio::test]
async fn test_run_async_reports_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RedactConfig::new("1.1.1.1", "h", "u", dir.path().join("missing.zip"));

    let err = run_async(config, PipelineOptions::default()).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Extracting));
    assert!(matches!(err.root_cause(), arcanon::Error::Io(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_runs_are_independent() {
    let (dir, first) = common::zip_fixture("one.zip", common::SAMPLE_ENTRIES);
    let second = common::write_zip(dir.path(), "two.zip", &[("x.txt", b"User: carol")]);
    let out = dir.path().join("out");

    let a = run_async(
        RedactConfig::new("192.168.0.1", "HOST", "anon", &first),
        PipelineOptions::new().output_dir(&out),
    );
    let b = run_async(
        RedactConfig::new("192.168.0.1", "HOST", "anon", &second),
        PipelineOptions::new().output_dir(&out),
    );
    let (a, b) = tokio::join!(a, b);

    assert_eq!(a.unwrap().repack.entries_written, 2);
    let b = b.unwrap();
    assert_eq!(common::read_zip(&b.output_path)[0].1, b"User: anon");
}
