//! orientbatch - Batch scripting SDK for OrientDB
//!
//! This crate builds server-side batch scripts for OrientDB's scripting
//! dialect, submits them atomically through a pluggable network client,
//! and maps the record response back into typed, reference-resolved
//! results.
//!
//! # Quick Start
//!
//! ```no_run
//! use orientbatch::{Batch, ScriptCommand};
//! # use orientbatch::{BatchError, CacheHook, Element, Materializer, Record, ScriptClient};
//! # use std::sync::Arc;
//! # struct Client;
//! # impl ScriptClient for Client {
//! #     fn execute_script(&self, _: &str, _: Option<&CacheHook>) -> Result<Vec<Record>, BatchError> { Ok(vec![]) }
//! # }
//! # struct Mapper;
//! # impl Materializer for Mapper {
//! #     fn materialize_one(&self, r: &Record, _: Option<&CacheHook>) -> Result<Element, BatchError> {
//! #         Ok(Element::new(None, None, r.fields().clone()))
//! #     }
//! # }
//!
//! # fn main() -> Result<(), BatchError> {
//! let mut batch = Batch::new(Arc::new(Client), Arc::new(Mapper));
//!
//! // Bind interdependent operations to script variables
//! batch.assign("v", ScriptCommand::create_vertex("CREATE VERTEX Person SET name = 'Ada'"));
//! batch.assign("e", ScriptCommand::create_edge("CREATE EDGE Knows FROM $v TO #9:0"));
//!
//! // Commit atomically, returning the created vertex
//! let vertex = batch.commit_returning("$v", None)?.result()?.into_one();
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Application Code (Your Rust App)      │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  orientbatch (this crate)               │
//! │  - Batch (script builder + commits)     │
//! │  - ScriptBuffer (nestable statements)   │
//! │  - CompiledBatch (deferred execution)   │
//! │  - BatchResult (response decoding)      │
//! │  - Registry / BatchFactory (commands)   │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  Collaborators (provided by the caller) │
//! │  - ScriptClient (wire protocol)         │
//! │  - Materializer (object-graph mapping)  │
//! │  - ElementCache (optional cache hook)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`batch`] - The batch builder core: assignment, branches, commits
//! - [`client`] - Collaborator traits and record/element carriers
//! - [`command`] - Command text fragments and literal rendering
//! - [`decode`] - Response decoding into typed results
//! - [`deferred`] - Compiled batches with deferred formatting
//! - [`error`] - Error types
//! - [`registry`] - Class registry and command factories
//! - [`sanitize`] - Process-wide variable name sanitization
//! - [`script`] - The nestable statement buffer
//! - [`variable`] - Batch variables and assignment values

pub mod batch;
pub mod client;
pub mod command;
pub mod decode;
pub mod deferred;
pub mod error;
pub mod registry;
pub mod sanitize;
pub mod script;
pub mod variable;

// Re-export the common surface for convenience
pub use batch::{
    Batch, BatchExecution, BatchOptions, BranchOutcome, CollectOptions, Condition, IsolationLevel,
    ReturnTarget,
};
pub use client::{CacheHook, Element, ElementCache, Materializer, Record, ScriptClient};
pub use command::{Command, CommandKind, ScriptCommand};
pub use decode::BatchResult;
pub use deferred::CompiledBatch;
pub use error::{BatchError, Result};
pub use registry::{
    BatchFactory, ClassCommandFactory, ClassDescriptor, CommandFactory, ElementClass, ElementKind,
    Endpoint, Registry, VertexVector,
};
pub use sanitize::{set_name_sanitizer, DefaultSanitizer, NameSanitizer};
pub use script::ScriptBuffer;
pub use variable::{BatchValue, BatchVariable, VariableKind};
