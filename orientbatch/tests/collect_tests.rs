//! Multi-variable collection with run-length framing

#[path = "testutils/mod.rs"]
mod testutils;

use orientbatch::{BatchOptions, CollectOptions, ScriptCommand};
use serde_json::json;
use testutils::{batch_fixture, record, size_record};

#[test]
fn test_collect_emits_probes_commit_and_union() {
    let (client, mut batch) = batch_fixture(BatchOptions::default());

    batch.assign("a", ScriptCommand::retrieval("SELECT FROM A"));
    batch.assign("b", ScriptCommand::retrieval("SELECT FROM B"));
    batch.collect(&["a", "b"], CollectOptions::default()).unwrap();

    assert_eq!(
        client.last_script(),
        "BEGIN\n\
         LET a = SELECT FROM A\n\
         LET b = SELECT FROM B\n\
         LET _a = SELECT $a.size() as size\n\
         LET _b = SELECT $b.size() as size\n\
         COMMIT\n\
         RETURN (SELECT expand(unionall($_a,$a,$_b,$b)))"
    );
}

#[test]
fn test_collect_with_retries_and_fetch_plan() {
    let (client, mut batch) = batch_fixture(BatchOptions::default());

    batch.assign("a", ScriptCommand::retrieval("SELECT FROM A"));
    batch
        .collect(
            &["a"],
            CollectOptions {
                retries: Some(4),
                fetch_plan: Some("*:1".to_string()),
            },
        )
        .unwrap();

    let script = client.last_script();
    assert!(script.contains("COMMIT RETRY 4"));
    assert!(script.ends_with("RETURN (SELECT expand(unionall($_a,$a)) FETCHPLAN *:1)"));
}

#[test]
fn test_collect_ignores_duplicate_names() {
    let (client, mut batch) = batch_fixture(BatchOptions::default());

    batch.assign("a", ScriptCommand::retrieval("SELECT FROM A"));
    batch.collect(&["a", "a"], CollectOptions::default()).unwrap();

    let script = client.last_script();
    assert_eq!(script.matches("LET _a = ").count(), 1);
    assert!(script.ends_with("RETURN (SELECT expand(unionall($_a,$a)))"));
}

#[test]
fn test_collect_decodes_run_length_framed_response() {
    let (client, mut batch) = batch_fixture(BatchOptions::default());
    client.push_response(vec![
        size_record(2),
        record("x1"),
        record("x2"),
        size_record(1),
        record("y1"),
    ]);

    batch.assign("a", ScriptCommand::retrieval("SELECT FROM A"));
    batch.assign("b", ScriptCommand::retrieval("SELECT FROM B"));
    let result = batch
        .collect(&["a", "b"], CollectOptions::default())
        .unwrap()
        .result()
        .unwrap();

    let collected = result.into_collected().expect("collected map");
    assert_eq!(collected.len(), 2);
    assert_eq!(collected["a"].len(), 2);
    assert_eq!(collected["a"][0].property("name"), Some(&json!("x1")));
    assert_eq!(collected["a"][1].property("name"), Some(&json!("x2")));
    assert_eq!(collected["b"].len(), 1);
    assert_eq!(collected["b"][0].property("name"), Some(&json!("y1")));
}

#[test]
fn test_collect_empty_runs() {
    let (client, mut batch) = batch_fixture(BatchOptions::default());
    client.push_response(vec![size_record(0), size_record(1), record("y1")]);

    batch.assign("a", ScriptCommand::retrieval("SELECT FROM A"));
    batch.assign("b", ScriptCommand::retrieval("SELECT FROM B"));
    let collected = batch
        .collect(&["a", "b"], CollectOptions::default())
        .unwrap()
        .result()
        .unwrap()
        .into_collected()
        .expect("collected map");

    assert!(collected["a"].is_empty());
    assert_eq!(collected["b"].len(), 1);
}

#[test]
fn test_collect_clears_builder() {
    let (_client, mut batch) = batch_fixture(BatchOptions::default());
    batch.assign("a", ScriptCommand::retrieval("SELECT FROM A"));
    batch.collect(&["a"], CollectOptions::default()).unwrap();
    assert_eq!(batch.script_text(), "BEGIN");
    assert!(batch.variable("a").is_err());
}
