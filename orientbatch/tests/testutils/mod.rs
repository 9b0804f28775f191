//! Shared fixtures for the integration tests

// Each test binary compiles its own copy; not every binary uses every helper.
#![allow(dead_code)]

use orientbatch::{
    Batch, BatchError, BatchOptions, CacheHook, Element, Materializer, Record, ScriptClient,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Script client capturing every submitted script and replaying canned
/// record responses in FIFO order
#[derive(Default)]
pub struct RecordingClient {
    scripts: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Vec<Record>>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingClient::default())
    }

    /// Queue the response for the next execution
    pub fn push_response(&self, records: Vec<Record>) {
        self.responses
            .lock()
            .expect("response queue lock")
            .push_back(records);
    }

    /// Every script submitted so far, in order
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().expect("script log lock").clone()
    }

    /// The most recently submitted script
    pub fn last_script(&self) -> String {
        self.scripts()
            .last()
            .cloned()
            .expect("no script was executed")
    }

    pub fn execution_count(&self) -> usize {
        self.scripts.lock().expect("script log lock").len()
    }
}

impl ScriptClient for RecordingClient {
    fn execute_script(
        &self,
        script: &str,
        cache: Option<&CacheHook>,
    ) -> Result<Vec<Record>, BatchError> {
        self.scripts
            .lock()
            .expect("script log lock")
            .push(script.to_string());

        let records = self
            .responses
            .lock()
            .expect("response queue lock")
            .pop_front()
            .unwrap_or_default();

        if let Some(cache) = cache {
            for record in &records {
                cache.store(record);
            }
        }

        Ok(records)
    }
}

/// Materializer copying record fields straight into an element
pub struct PropsMaterializer;

impl Materializer for PropsMaterializer {
    fn materialize_one(
        &self,
        record: &Record,
        _cache: Option<&CacheHook>,
    ) -> Result<Element, BatchError> {
        Ok(Element::new(None, None, record.fields().clone()))
    }
}

/// Cache hook counting stored records
#[derive(Default)]
pub struct CountingCache {
    stored: AtomicUsize,
}

impl CountingCache {
    pub fn stored(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }
}

impl orientbatch::ElementCache for CountingCache {
    fn store(&self, _record: &Record) {
        self.stored.fetch_add(1, Ordering::SeqCst);
    }
}

/// A record with a single `name` field
pub fn record(name: &str) -> Record {
    Record::with_field("name", json!(name))
}

/// A run-length header record
pub fn size_record(n: u64) -> Record {
    Record::with_field("size", json!(n))
}

/// A batch over a fresh recording client and the props materializer
pub fn batch_fixture(options: BatchOptions) -> (Arc<RecordingClient>, Batch) {
    let _ = env_logger::builder().is_test(true).try_init();
    let client = RecordingClient::new();
    let batch = Batch::with_options(
        Arc::clone(&client) as Arc<dyn ScriptClient>,
        Arc::new(PropsMaterializer),
        options,
    );
    (client, batch)
}
