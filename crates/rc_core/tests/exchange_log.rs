use std::thread;

use pretty_assertions::assert_eq;
use rc_core::error::codes;
use rc_core::exchange::{ExchangeLog, NewExchange, SharedExchangeLog};
use serde_json::json;

#[test]
fn ids_follow_insertion_order() {
    let mut log = ExchangeLog::new();
    assert!(log.is_empty());

    for n in 0..5u64 {
        let id = log.record(NewExchange::new("researcher", Some("reviewer"), format!("draft {n}")));
        assert_eq!(id, n);
    }

    let export = log.export();
    assert_eq!(export.exchanges.len(), 5);
    for (idx, ex) in export.exchanges.iter().enumerate() {
        assert_eq!(ex.id, idx as u64);
        assert_eq!(ex.message, format!("draft {idx}"));
    }
}

#[test]
fn export_shape_matches_wire_format() {
    let mut log = ExchangeLog::new();
    log.record(NewExchange::new("ingestor", Some("llm"), "ingest:paper.txt"));
    log.record(
        NewExchange::new("llm", None, "summary")
            .with_response("A. B.")
            .with_meta("path", "heuristic"),
    );

    let v = serde_json::to_value(log.export()).expect("json");
    let exchanges = v["exchanges"].as_array().expect("array");
    assert_eq!(exchanges.len(), 2);

    let first = &exchanges[0];
    assert_eq!(first["id"], json!(0));
    assert_eq!(first["from"], json!("ingestor"));
    assert_eq!(first["to"], json!("llm"));
    assert_eq!(first["response"], json!(null));
    assert_eq!(first["meta"], json!({}));
    let ts = first["timestamp"].as_str().expect("timestamp");
    assert!(ts.ends_with('Z'), "timestamp should be UTC RFC3339: {ts}");

    let second = &exchanges[1];
    assert_eq!(second["to"], json!(null));
    assert_eq!(second["response"], json!("A. B."));
    assert_eq!(second["meta"], json!({"path": "heuristic"}));
}

#[test]
fn save_then_load_continues_the_sequence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conversation_graph.json");

    let mut log = ExchangeLog::new();
    log.record(NewExchange::new("researcher", Some("synthesizer"), "Über résumé ✓"));
    log.record(
        NewExchange::new("llm", Some("synthesizer"), "structured_reasoning")
            .with_response(json!({"summary": "", "claims": [], "evidence": []})),
    );
    log.save(&path).expect("save");

    let raw = std::fs::read_to_string(&path).expect("read");
    assert!(raw.contains("Über résumé ✓"), "non-ASCII should be written verbatim");

    let mut loaded = ExchangeLog::load(&path).expect("load");
    assert_eq!(loaded.export(), log.export());
    assert_eq!(loaded.record(NewExchange::new("a", None, "next")), 2);
}

#[test]
fn load_rejects_out_of_order_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"exchanges":[{"id":1,"timestamp":"2026-02-10T00:00:00Z","from":"a","to":null,"message":"m","response":null,"meta":{}}]}"#,
    )
    .expect("write");

    let err = ExchangeLog::load(&path).expect_err("should fail");
    assert_eq!(err.code, codes::EXCHANGE_LOG_INVALID);
}

#[test]
fn load_reports_missing_and_malformed_files() {
    let dir = tempfile::tempdir().expect("tempdir");

    let err = ExchangeLog::load(&dir.path().join("missing.json")).expect_err("missing");
    assert_eq!(err.code, codes::EXCHANGE_LOAD_FAILED);

    let path = dir.path().join("garbage.json");
    std::fs::write(&path, "not json").expect("write");
    let err = ExchangeLog::load(&path).expect_err("garbage");
    assert_eq!(err.code, codes::EXCHANGE_LOAD_FAILED);
}

#[test]
fn save_into_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nope").join("graph.json");
    let err = ExchangeLog::new().save(&path).expect_err("should fail");
    assert_eq!(err.code, codes::EXCHANGE_EXPORT_FAILED);
}

#[test]
fn shared_log_keeps_ids_dense_under_concurrent_writers() {
    let shared = SharedExchangeLog::new();
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let log = shared.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    log.record(NewExchange::new(format!("agent-{t}"), None, format!("msg {i}")));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("join");
    }

    let export = shared.export();
    assert_eq!(shared.len(), 200);
    assert_eq!(export.exchanges.len(), 200);
    for (idx, ex) in export.exchanges.iter().enumerate() {
        assert_eq!(ex.id, idx as u64);
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");
    shared.save(&path).expect("save");
    assert_eq!(ExchangeLog::load(&path).expect("load").len(), 200);
}

#[test]
fn failed_finalize_leaves_no_temp_files_behind() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A non-empty directory at the destination makes the final rename fail.
    let dest = dir.path().join("graph.json");
    std::fs::create_dir(&dest).expect("mkdir");
    std::fs::write(dest.join("keep.txt"), "x").expect("write");

    let mut log = ExchangeLog::new();
    log.record(NewExchange::new("a", None, "m"));
    let err = log.save(&dest).expect_err("rename over directory");
    assert_eq!(err.code, codes::EXCHANGE_EXPORT_FAILED);

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["graph.json".to_string()]);
}

#[test]
fn save_does_not_touch_sibling_tmp_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("graph.json");
    let sibling = dir.path().join("graph.tmp");
    std::fs::write(&sibling, "unrelated").expect("write");

    let mut log = ExchangeLog::new();
    log.record(NewExchange::new("a", None, "m"));
    log.save(&path).expect("save");

    assert_eq!(std::fs::read_to_string(&sibling).expect("read"), "unrelated");
    assert_eq!(ExchangeLog::load(&path).expect("load").len(), 1);
}
