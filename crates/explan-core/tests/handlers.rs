//! File-backed sinks end to end: deferred creation, close semantics, and
//! the NDJSON feed.

use explan_core::{objects, FileHandler, JsonlHandler, Logger};

#[test]
fn file_is_created_on_first_record_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.txt");

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(FileHandler::create(&path));
    assert!(!path.exists());

    logger.start(objects!["Starting block ", 1]).unwrap();
    logger.explain(objects!["I'm explanation 1.1"]).unwrap();
    logger.end(objects!["End of block ", 1]).unwrap();
    logger.close().unwrap();
    // Idempotent.
    logger.close().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "* Starting block 1");
    assert_eq!(lines[1], "** I'm explanation 1.1");
    assert!(lines[2].starts_with("* End of block 1 ("), "got: {}", lines[2]);
    assert!(lines[2].ends_with(" ms)"), "got: {}", lines[2]);
}

#[test]
fn suppressed_run_never_creates_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silent.txt");

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.set_importance_threshold(1000.0);
    logger.add_handler(FileHandler::create(&path));

    logger.explain(objects!["nobody hears this"]).unwrap();
    logger.close().unwrap();
    assert!(!path.exists());
}

#[test]
fn configured_file_handler_renders_marker_and_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deco.txt");

    let mut handler = FileHandler::create(&path);
    handler.set_nesting_string("#");
    handler.set_include_timestamp(true);
    handler.set_include_block_time(false);

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(handler);
    logger.start(objects!["open"]).unwrap();
    logger.explain(objects!["inside"]).unwrap();
    logger.end(objects!["close"]).unwrap();
    logger.close().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("# open ("), "got: {}", lines[0]);
    assert!(lines[1].starts_with("## inside ("), "got: {}", lines[1]);
    // Block time disabled: the close line carries only the timestamp suffix.
    assert!(lines[2].starts_with("# close ("), "got: {}", lines[2]);
    assert!(!lines[2].ends_with(" ms)"), "got: {}", lines[2]);
}

#[test]
fn jsonl_feed_round_trips_through_serde() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(JsonlHandler::create(&path));

    logger.start_at(2.0, objects!["phase ", 1]).unwrap();
    logger.explain(objects!["step"]).unwrap();
    logger.end(objects!["phase ", 1, " done"]).unwrap();
    logger.close().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let records: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);

    assert_eq!(records[0]["depth"], 0);
    assert_eq!(records[0]["text"], "phase 1");
    assert_eq!(records[0]["importance"], 2.0);

    assert_eq!(records[1]["depth"], 1);
    assert_eq!(records[1]["text"], "step");
    // Unweighted leaf inherits the enclosing block's effective importance.
    assert_eq!(records[1]["importance"], 2.0);

    assert_eq!(records[2]["depth"], 0);
    assert_eq!(records[2]["text"], "phase 1 done");
    assert!(records[2]["block_time_ms"].is_u64());
}

#[test]
fn both_feeds_can_share_one_logger() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("trace.txt");
    let jsonl_path = dir.path().join("trace.jsonl");

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(FileHandler::create(&text_path));
    logger.add_handler(JsonlHandler::create(&jsonl_path));

    logger.explain(objects!["Hello, ", "World", "!!!"]).unwrap();
    logger.close().unwrap();

    assert_eq!(
        std::fs::read_to_string(&text_path).unwrap(),
        "* Hello, World!!!\n"
    );
    let json: serde_json::Value =
        serde_json::from_str(std::fs::read_to_string(&jsonl_path).unwrap().trim()).unwrap();
    assert_eq!(json["text"], "Hello, World!!!");
}
