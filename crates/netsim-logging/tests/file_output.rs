//! JSONL file output end to end
//!
//! Lives in its own test binary because it installs the global subscriber.

use netsim_logging::{FileConfig, RotationStrategy, SubscriberBuilder};

#[test]
fn test_jsonl_file_output() {
    let dir = tempfile::tempdir().unwrap();

    let guard = SubscriberBuilder::new()
        .with_level("info")
        .with_console(false)
        .with_file_output(FileConfig {
            directory: dir.path().to_path_buf(),
            prefix: "run".to_string(),
            rotation: RotationStrategy::Never,
        })
        .try_init()
        .unwrap()
        .expect("file output returns a guard");

    tracing::info!(sender = "n0", receiver = "n3", "transmission started");
    tracing::debug!("filtered out at info");

    // Dropping the guard flushes the non-blocking writer
    drop(guard);

    let contents = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["message"], "transmission started");
    assert_eq!(record["sender"], "n0");
    assert_eq!(record["level"], "INFO");

    // A second global subscriber is refused, not panicked on
    assert!(SubscriberBuilder::new().try_init().is_err());
}
