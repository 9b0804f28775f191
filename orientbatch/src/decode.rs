//! Response decoding
//!
//! A batch knows what shape it asked the server for before the response
//! arrives: nothing, a single element, a record set, or a run-length
//! framed union of several variables. The shape is captured at commit
//! time (before the builder state is cleared) and applied to the raw
//! record sequence here.

use crate::client::{CacheHook, Element, Materializer, Record};
use crate::error::{BatchError, Result};
use std::collections::HashMap;

/// Decoded outcome of executing a batch script
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult {
    /// Commit without a return value, or an empty response
    None,
    /// A single materialized element
    One(Element),
    /// A materialized record set
    Many(Vec<Element>),
    /// Per-variable record sets from a `collect` commit
    Collected(HashMap<String, Vec<Element>>),
}

impl BatchResult {
    pub fn into_one(self) -> Option<Element> {
        match self {
            BatchResult::One(element) => Some(element),
            _ => None,
        }
    }

    pub fn into_many(self) -> Option<Vec<Element>> {
        match self {
            BatchResult::Many(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn into_collected(self) -> Option<HashMap<String, Vec<Element>>> {
        match self {
            BatchResult::Collected(collected) => Some(collected),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, BatchResult::None)
    }
}

/// Response shape requested by a commit, captured before `clear()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReturnShape {
    /// Execute and discard the records
    Discard,
    /// A `RETURN` of a single rendered target
    Value {
        /// The rendered return string opened with `[` or `{`; the whole
        /// response is a record set regardless of its length
        collection_literal: bool,
        /// The returned variable was query-kind; a single record is
        /// still a record set
        set_kind: bool,
    },
    /// Run-length framed union of the named variables, in emission order
    Collected { names: Vec<String> },
}

/// Decode a raw record sequence against the requested shape
pub(crate) fn decode_response(
    shape: &ReturnShape,
    records: &[Record],
    materializer: &dyn Materializer,
    cache: Option<&CacheHook>,
) -> Result<BatchResult> {
    match shape {
        ReturnShape::Discard => Ok(BatchResult::None),
        ReturnShape::Value {
            collection_literal,
            set_kind,
        } => {
            if records.is_empty() {
                return Ok(BatchResult::None);
            }
            if *collection_literal || *set_kind || records.len() > 1 {
                let elements = materializer.materialize_many(records, cache)?;
                Ok(BatchResult::Many(elements))
            } else {
                let element = materializer.materialize_one(&records[0], cache)?;
                Ok(BatchResult::One(element))
            }
        }
        ReturnShape::Collected { names } => {
            let collected = decode_collected(names, records, materializer, cache)?;
            Ok(BatchResult::Collected(collected))
        }
    }
}

/// Consume a run-length framed response
///
/// The flat sequence interleaves one count record before each variable's
/// run: `[count_a, a1..aN, count_b, b1..bM, ...]`, in the same variable
/// order used when the union query was emitted.
fn decode_collected(
    names: &[String],
    records: &[Record],
    materializer: &dyn Materializer,
    cache: Option<&CacheHook>,
) -> Result<HashMap<String, Vec<Element>>> {
    let mut collected = HashMap::with_capacity(names.len());
    let mut cursor = 0usize;

    for name in names {
        let header = records.get(cursor).ok_or_else(|| {
            BatchError::Decode(format!("missing run-length record for variable '{}'", name))
        })?;
        let run_length = run_length_of(name, header)?;

        let start = cursor + 1;
        let sentinel = start + run_length;
        let run = records.get(start..sentinel).ok_or_else(|| {
            BatchError::Decode(format!(
                "variable '{}' declared {} record(s) but the response is truncated",
                name, run_length
            ))
        })?;

        collected.insert(name.clone(), materializer.materialize_many(run, cache)?);
        cursor = sentinel;
    }

    Ok(collected)
}

/// Read the `size` field of a run-length header record
fn run_length_of(name: &str, header: &Record) -> Result<usize> {
    let size = header.field("size").ok_or_else(|| {
        BatchError::Decode(format!(
            "run-length record for variable '{}' has no 'size' field",
            name
        ))
    })?;
    size.as_u64()
        .or_else(|| size.as_f64().map(|f| f as u64))
        .map(|n| n as usize)
        .ok_or_else(|| {
            BatchError::Decode(format!(
                "run-length for variable '{}' is not a number: {}",
                name, size
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FieldMaterializer;

    impl Materializer for FieldMaterializer {
        fn materialize_one(&self, record: &Record, _cache: Option<&CacheHook>) -> Result<Element> {
            Ok(Element::new(None, None, record.fields().clone()))
        }
    }

    fn record(name: &str) -> Record {
        Record::with_field("name", json!(name))
    }

    fn size_record(n: u64) -> Record {
        Record::with_field("size", json!(n))
    }

    #[test]
    fn test_discard_ignores_records() {
        let result = decode_response(
            &ReturnShape::Discard,
            &[record("x")],
            &FieldMaterializer,
            None,
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_single_record_unwraps() {
        let shape = ReturnShape::Value {
            collection_literal: false,
            set_kind: false,
        };
        let result = decode_response(&shape, &[record("x")], &FieldMaterializer, None).unwrap();
        let element = result.into_one().expect("single element");
        assert_eq!(element.property("name"), Some(&json!("x")));
    }

    #[test]
    fn test_query_kind_forces_set() {
        let shape = ReturnShape::Value {
            collection_literal: false,
            set_kind: true,
        };
        let result = decode_response(&shape, &[record("x")], &FieldMaterializer, None).unwrap();
        assert_eq!(result.into_many().map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_multi_record_forces_set() {
        let shape = ReturnShape::Value {
            collection_literal: false,
            set_kind: false,
        };
        let records = [record("x"), record("y")];
        let result = decode_response(&shape, &records, &FieldMaterializer, None).unwrap();
        assert_eq!(result.into_many().map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_empty_response_is_none() {
        let shape = ReturnShape::Value {
            collection_literal: true,
            set_kind: false,
        };
        let result = decode_response(&shape, &[], &FieldMaterializer, None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_run_length_framing() {
        let shape = ReturnShape::Collected {
            names: vec!["a".to_string(), "b".to_string()],
        };
        let records = [
            size_record(2),
            record("x1"),
            record("x2"),
            size_record(1),
            record("y1"),
        ];
        let result = decode_response(&shape, &records, &FieldMaterializer, None).unwrap();
        let collected = result.into_collected().expect("collected map");
        assert_eq!(collected["a"].len(), 2);
        assert_eq!(collected["b"].len(), 1);
        assert_eq!(collected["b"][0].property("name"), Some(&json!("y1")));
    }

    #[test]
    fn test_truncated_run_is_an_error() {
        let shape = ReturnShape::Collected {
            names: vec!["a".to_string()],
        };
        let records = [size_record(3), record("x1")];
        let err = decode_response(&shape, &records, &FieldMaterializer, None).unwrap_err();
        assert!(matches!(err, BatchError::Decode(_)));
    }

    #[test]
    fn test_missing_size_field_is_an_error() {
        let shape = ReturnShape::Collected {
            names: vec!["a".to_string()],
        };
        let records = [record("x1")];
        let err = decode_response(&shape, &records, &FieldMaterializer, None).unwrap_err();
        assert!(matches!(err, BatchError::Decode(_)));
    }
}
