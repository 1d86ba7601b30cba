//! Partitioned, paginated and asynchronously completed fetches against a
//! scripted statement API.

mod common;

use common::{init_logger, FakeStatementApi, RecordingSleeper};
use serde_json::json;
use sqlbridge_commons::{BridgeError, PollingSettings};
use sqlbridge_link::fetch::{CollectingConsumer, FetchDriver, SinkAccumulator};
use sqlbridge_link::models::{ErrorDetail, Page, StatementResponse};
use sqlbridge_link::{ExecutionState, ExecutionTracker};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

fn polling(base_ms: u64, max_ms: u64) -> PollingSettings {
    PollingSettings {
        base_interval_ms: base_ms,
        max_interval_ms: max_ms,
        max_polls: None,
    }
}

fn submitted() -> ExecutionTracker {
    let mut tracker = ExecutionTracker::new();
    tracker.submit().unwrap();
    tracker
}

#[test]
fn test_three_page_fetch_captures_header_once() {
    init_logger();
    let first = Page {
        data: vec![
            vec![json!("id"), json!("name")],
            vec![json!(1), json!("ada")],
            vec![json!(2), json!("bob")],
        ],
        next_token: Some("t1".to_string()),
    };
    let api = FakeStatementApi::new(StatementResponse::succeeded("q1").with_first_page(first, true))
        .with_page("t1", vec![vec![json!(3), json!("cy")]], Some("t2"))
        .with_page("t2", vec![vec![json!(4), json!("di")], vec![json!(5), json!("ed")]], None);
    let calls = api.calls();

    let mut driver = FetchDriver::new(Box::new(api), &polling(10, 100));
    let mut sink = Cursor::new(Vec::new());
    let mut acc = SinkAccumulator::new(&mut sink, None, b',');
    let summary = driver.run("SELECT * FROM t", &mut acc, &mut submitted()).unwrap();
    assert_eq!(acc.finish().unwrap(), 5);

    assert_eq!(summary.segments, 3);
    assert_eq!(summary.rows, 5);
    assert_eq!(
        String::from_utf8(sink.into_inner()).unwrap(),
        "id,name\n1,ada\n2,bob\n3,cy\n4,di\n5,ed\n"
    );
    assert_eq!(*calls.lock(), vec!["submit", "page:t1", "page:t2"]);
}

#[test]
fn test_leading_header_ignored_when_columns_known() {
    init_logger();
    let first = Page {
        data: vec![vec![json!("label")], vec![json!(1)]],
        next_token: None,
    };
    let response = StatementResponse::succeeded("q")
        .with_first_page(first, true)
        .with_columns(["id"]);
    let mut driver = FetchDriver::new(Box::new(FakeStatementApi::new(response)), &polling(10, 100));

    let mut consumer = CollectingConsumer::new();
    driver.run("SELECT 1", &mut consumer, &mut submitted()).unwrap();
    assert_eq!(consumer.columns_seen(), ["id"]);
    assert_eq!(consumer.rows(), [vec![json!(1)]]);
}

#[test]
fn test_running_three_times_then_success_polls_four_times() {
    init_logger();
    let done = StatementResponse::succeeded("q7")
        .with_columns(["n"])
        .with_partitions(1, vec![vec![json!(42)]]);
    let api = FakeStatementApi::new(StatementResponse::running("q7"))
        .then_poll(StatementResponse::running("q7"))
        .then_poll(StatementResponse::running("q7"))
        .then_poll(StatementResponse::running("q7"))
        .then_poll(done);
    let calls = api.calls();
    let sleeper = Arc::new(RecordingSleeper::default());

    let mut driver = FetchDriver::new(Box::new(api), &polling(100, 1000)).with_sleeper(sleeper.clone());
    let mut consumer = CollectingConsumer::new();
    let mut tracker = submitted();
    driver.run("SELECT 42", &mut consumer, &mut tracker).unwrap();
    tracker.complete().unwrap();

    let polls = calls.lock().iter().filter(|c| c.starts_with("poll:")).count();
    assert_eq!(polls, 4);
    assert_eq!(tracker.polls(), 4);
    assert_eq!(tracker.state(), ExecutionState::Completed);

    let waits = sleeper.waits();
    assert_eq!(
        waits,
        [100, 200, 400, 800].map(Duration::from_millis).to_vec()
    );
    assert!(waits.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(consumer.rows(), [vec![json!(42)]]);
}

#[test]
fn test_backoff_resets_after_cap() {
    init_logger();
    let mut api = FakeStatementApi::new(StatementResponse::running("q"));
    for _ in 0..4 {
        api = api.then_poll(StatementResponse::running("q"));
    }
    api = api.then_poll(StatementResponse::succeeded("q"));
    let sleeper = Arc::new(RecordingSleeper::default());

    let mut driver = FetchDriver::new(Box::new(api), &polling(100, 300)).with_sleeper(sleeper.clone());
    driver
        .run("SELECT 1", &mut CollectingConsumer::new(), &mut submitted())
        .unwrap();
    assert_eq!(
        sleeper.waits(),
        [100, 200, 300, 100, 200].map(Duration::from_millis).to_vec()
    );
}

#[test]
fn test_failure_mid_poll_carries_remote_status() {
    init_logger();
    let api = FakeStatementApi::new(StatementResponse::running("q"))
        .then_poll(StatementResponse::running("q"))
        .then_poll(StatementResponse::failed(
            "q",
            ErrorDetail {
                code: Some("DIVISION_BY_ZERO".to_string()),
                message: "division by zero".to_string(),
            },
        ));
    let mut driver = FetchDriver::new(Box::new(api), &polling(1, 2))
        .with_sleeper(Arc::new(RecordingSleeper::default()));

    let mut tracker = ExecutionTracker::new();
    let err = tracker
        .track(|t| driver.run("SELECT 1/0", &mut CollectingConsumer::new(), t))
        .unwrap_err();
    match err {
        BridgeError::ExecutionError { status, message } => {
            assert_eq!(status.as_deref(), Some("DIVISION_BY_ZERO"));
            assert_eq!(message, "division by zero");
        },
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(tracker.state(), ExecutionState::Failed);
}

#[test]
fn test_max_polls_bounds_waiting() {
    init_logger();
    let mut api = FakeStatementApi::new(StatementResponse::running("slow"));
    for _ in 0..10 {
        api = api.then_poll(StatementResponse::running("slow"));
    }
    let mut settings = polling(1, 4);
    settings.max_polls = Some(3);
    let mut driver = FetchDriver::new(Box::new(api), &settings).with_sleeper(Arc::new(RecordingSleeper::default()));

    let err = driver
        .run("SELECT 1", &mut CollectingConsumer::new(), &mut submitted())
        .unwrap_err();
    assert!(err.to_string().contains("still running after 3 polls"));
}

#[test]
fn test_partitions_share_one_header() {
    init_logger();
    let response = StatementResponse::succeeded("p")
        .with_columns(["id", "name"])
        .with_partitions(3, vec![vec![json!(1), json!("a")]]);
    let api = FakeStatementApi::new(response)
        .with_partition(1, vec![vec![json!(2), json!("b")], vec![json!(3), json!("c")]])
        .with_partition(2, vec![vec![json!(4), json!(null)]]);
    let calls = api.calls();

    let mut driver = FetchDriver::new(Box::new(api), &polling(10, 100));
    let mut sink = Cursor::new(Vec::new());
    let mut acc = SinkAccumulator::new(&mut sink, None, b'|');
    let summary = driver.run("SELECT * FROM p", &mut acc, &mut submitted()).unwrap();
    acc.finish().unwrap();

    assert_eq!(summary.segments, 3);
    assert_eq!(
        String::from_utf8(sink.into_inner()).unwrap(),
        "id|name\n1|a\n2|b\n3|c\n4|\n"
    );
    assert_eq!(*calls.lock(), vec!["submit", "partition:1", "partition:2"]);
}

#[test]
fn test_partition_zero_label_row_becomes_header() {
    init_logger();
    let response = StatementResponse::succeeded("p")
        .with_partitions(2, vec![vec![json!("id")], vec![json!(1)]])
        .with_leading_header(true);
    let api = FakeStatementApi::new(response).with_partition(1, vec![vec![json!(2)]]);
    let mut driver = FetchDriver::new(Box::new(api), &polling(10, 100));

    let mut consumer = CollectingConsumer::new();
    let summary = driver.run("SELECT id FROM p", &mut consumer, &mut submitted()).unwrap();
    assert_eq!(consumer.columns_seen(), ["id"]);
    assert_eq!(consumer.rows(), [vec![json!(1)], vec![json!(2)]]);
    assert_eq!(summary.rows, 2);

    let response = StatementResponse::succeeded("p")
        .with_columns(["n"])
        .with_partitions(1, vec![vec![json!("label")], vec![json!(7)]])
        .with_leading_header(true);
    let mut driver = FetchDriver::new(Box::new(FakeStatementApi::new(response)), &polling(10, 100));
    let mut sink = Cursor::new(Vec::new());
    let mut acc = SinkAccumulator::new(&mut sink, None, b',');
    driver.run("SELECT n FROM p", &mut acc, &mut submitted()).unwrap();
    acc.finish().unwrap();
    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "n\n7\n");
}

#[test]
fn test_missing_partition_aborts_fetch() {
    init_logger();
    let response = StatementResponse::succeeded("p")
        .with_columns(["id"])
        .with_partitions(3, vec![vec![json!(1)]]);
    let api = FakeStatementApi::new(response).with_partition(1, vec![vec![json!(2)]]);
    let mut driver = FetchDriver::new(Box::new(api), &polling(10, 100));

    let err = driver
        .run("SELECT id FROM p", &mut CollectingConsumer::new(), &mut submitted())
        .unwrap_err();
    assert!(matches!(err, BridgeError::ExecutionError { status: Some(ref s), .. } if s == "404"));
}
