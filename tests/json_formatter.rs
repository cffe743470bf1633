use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use tracing_log_format::formatter::{Formatter, JsonFormatter, StandardFormatter};
use tracing_log_format::record::{Level, LogRecord};
use tracing_log_format::template::TemplateCompiler;
use tracing_log_format::FormatError;

fn record(level: Level, msg: &str) -> LogRecord {
    LogRecord::new(level, "orders.api", msg)
        .with_timestamp(Utc.with_ymd_and_hms(2023, 11, 5, 8, 4, 2).unwrap())
        .with_location("src/orders/api.rs", 214)
        .with_module_path("orders::api")
}

#[test]
fn output_round_trips_to_one_key_per_template() {
    let fields = BTreeMap::from([
        ("time".to_string(), "%(asctime)s".to_string()),
        ("level".to_string(), "%(levelname)s/%(levelno)d".to_string()),
        ("where".to_string(), "%(filename)s:%(lineno)d in %(module)s".to_string()),
        ("msg".to_string(), "%(message)s".to_string()),
        ("static".to_string(), "100%% literal".to_string()),
    ]);
    let formatter = JsonFormatter::new(&fields, "%Y-%m-%dT%H:%M:%S", false).unwrap();

    let mut rec = record(Level::Warn, "order {} delayed").with_args(["A-17"]);
    let output = formatter.format(&mut rec);
    let decoded: BTreeMap<String, Value> = serde_json::from_str(&output).unwrap();

    assert_eq!(
        decoded.keys().collect::<Vec<_>>(),
        fields.keys().collect::<Vec<_>>()
    );
    for (key, template) in &fields {
        let expected = TemplateCompiler::new("%Y-%m-%dT%H:%M:%S")
            .compile(template)
            .unwrap()
            .render(&mut rec);
        assert_eq!(decoded[key], Value::String(expected), "key {key}");
    }
    assert_eq!(decoded["time"], "2023-11-05T08:04:02");
    assert_eq!(decoded["level"], "WARN/30");
    assert_eq!(decoded["where"], "api.rs:214 in orders::api");
    assert_eq!(decoded["msg"], "order A-17 delayed");
    assert_eq!(decoded["static"], "100% literal");
}

#[test]
fn pretty_output_decodes_to_same_object() {
    let fields = [("lvl", "%(levelname)s"), ("msg", "%(message)s")];
    let compact = JsonFormatter::new(fields, "%Y", false).unwrap();
    let pretty = JsonFormatter::new(fields, "%Y", true).unwrap();
    assert!(pretty.is_pretty());

    let a: Value = serde_json::from_str(&compact.format(&mut record(Level::Error, "boom"))).unwrap();
    let b: Value = serde_json::from_str(&pretty.format(&mut record(Level::Error, "boom"))).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, serde_json::json!({"lvl": "ERROR", "msg": "boom"}));
}

#[test]
fn empty_field_map_serializes_empty_object() {
    let formatter = JsonFormatter::new(Vec::<(String, String)>::new(), "%Y", false).unwrap();
    assert_eq!(formatter.format(&mut record(Level::Info, "x")), "{}");
}

#[test]
fn construction_fails_before_any_record_is_seen() {
    let err = JsonFormatter::new([("x", "%(levelname)s %(user_id)s")], "%Y", false).unwrap_err();
    assert_eq!(err, FormatError::UnknownField("user_id".to_string()));

    let err = StandardFormatter::new("%(levelname)i", "%Y").unwrap_err();
    assert_eq!(
        err,
        FormatError::UnsupportedConversion {
            field: "levelname".to_string(),
            conversion: 'i',
        }
    );
}

#[test]
fn formatter_is_shared_across_threads() {
    let formatter: Arc<dyn Formatter> = Arc::new(
        JsonFormatter::new(
            [("msg", "%(message)s"), ("lvl", "%(levelno)d"), ("t", "%(asctime)s")],
            "%H:%M:%S",
            false,
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let formatter = Arc::clone(&formatter);
            thread::spawn(move || {
                (0..100)
                    .map(|j| {
                        let mut rec = record(Level::Info, "worker {} item {}").with_args([i, j]);
                        formatter.format(&mut rec)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        for (j, line) in handle.join().unwrap().into_iter().enumerate() {
            let value: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(value["msg"], format!("worker {i} item {j}"));
            assert_eq!(value["lvl"], "20");
            assert_eq!(value["t"], "08:04:02");
        }
    }
}
