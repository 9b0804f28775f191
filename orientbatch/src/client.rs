//! Collaborator seams: network client, materializer and element cache
//!
//! The batch builder never talks to the wire itself. It hands a finished
//! script to a [`ScriptClient`] and maps the returned records back to
//! domain objects through a [`Materializer`]. Both are traits so that
//! applications plug in their own transport and object mapping, and so
//! tests can substitute mocks.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A single record returned by batch execution
///
/// Records are opaque key-value data; the batch layer only ever reads
/// fields by name (for example the `size` probes emitted by
/// [`Batch::collect`](crate::batch::Batch::collect)).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    data: Map<String, Value>,
}

impl Record {
    /// Create a record from raw field data
    pub fn new(data: Map<String, Value>) -> Self {
        Record { data }
    }

    /// Build a record holding a single field
    pub fn with_field(name: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(name.to_string(), value);
        Record { data }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// All fields of this record
    pub fn fields(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// A materialized graph element (vertex or edge)
///
/// The concrete object-graph mapping lives in the [`Materializer`]
/// collaborator; this type is the common shape its output takes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Record id assigned by the server, if any
    pub id: Option<String>,
    /// Class the element belongs to, if known
    pub class: Option<String>,
    /// Element properties
    pub properties: Map<String, Value>,
}

impl Element {
    pub fn new(id: Option<String>, class: Option<String>, properties: Map<String, Value>) -> Self {
        Element {
            id,
            class,
            properties,
        }
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// Cache hook threaded through script execution
///
/// The batch layer does not define a caching policy; it only forwards an
/// optional hook to the client so freshly fetched records can be stored.
pub trait ElementCache: Send + Sync {
    /// Called by the client for each record it receives
    fn store(&self, record: &Record);
}

/// Shared handle to a cache hook
pub type CacheHook = Arc<dyn ElementCache>;

/// Network client executing a finished batch script
///
/// The script text is the sole artifact handed over; the client returns
/// the ordered record sequence produced by the server. Execution is a
/// blocking call; timeouts and cancellation are the client's concern.
pub trait ScriptClient: Send + Sync {
    fn execute_script(&self, script: &str, cache: Option<&CacheHook>) -> Result<Vec<Record>>;
}

/// Object-graph materializer turning raw records into domain objects
pub trait Materializer: Send + Sync {
    /// Materialize a single record
    fn materialize_one(&self, record: &Record, cache: Option<&CacheHook>) -> Result<Element>;

    /// Materialize an ordered record sequence
    fn materialize_many(
        &self,
        records: &[Record],
        cache: Option<&CacheHook>,
    ) -> Result<Vec<Element>> {
        records
            .iter()
            .map(|record| self.materialize_one(record, cache))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_field_access() {
        let record = Record::with_field("size", json!(3));
        assert_eq!(record.field("size"), Some(&json!(3)));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_element_property_access() {
        let mut props = Map::new();
        props.insert("name".to_string(), json!("Alice"));
        let element = Element::new(Some("#9:0".to_string()), Some("Person".to_string()), props);
        assert_eq!(element.property("name"), Some(&json!("Alice")));
        assert_eq!(element.id.as_deref(), Some("#9:0"));
    }
}
