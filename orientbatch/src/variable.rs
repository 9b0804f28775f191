//! Batch variables and assignment values

use crate::command::{render_literal, Command, CommandKind};
use serde_json::Value;

/// Kind tag recorded with every bound variable
///
/// Drives the decoding strategy once the script has executed: a
/// `QueryResult` variable's response is always a record set, even with
/// exactly one record, while the other kinds unwrap a single-record
/// response to one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// A literal value converted to dialect text
    Plain,
    /// Bound to a vertex-creation command
    Vertex,
    /// Bound to an edge-creation command
    Edge,
    /// Bound to a retrieval/query command
    QueryResult,
}

impl From<CommandKind> for VariableKind {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::CreateVertex => VariableKind::Vertex,
            CommandKind::CreateEdge => VariableKind::Edge,
            CommandKind::Retrieval => VariableKind::QueryResult,
        }
    }
}

/// A named reference bound to a script-local symbol
///
/// Immutable once created. Every name lookup on a batch returns a clone,
/// so each reference has independent identity while sharing the symbol,
/// kind and source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchVariable {
    symbol: String,
    kind: VariableKind,
    source: String,
}

impl BatchVariable {
    pub fn new(symbol: impl Into<String>, kind: VariableKind, source: impl Into<String>) -> Self {
        BatchVariable {
            symbol: symbol.into(),
            kind,
            source: source.into(),
        }
    }

    /// The bare symbol, without the reference sigil
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// The rendered right-hand side this variable was bound to
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Script reference to this variable (`$symbol`)
    pub fn reference(&self) -> String {
        format!("${}", self.symbol)
    }
}

/// Right-hand side of a batch assignment
pub enum BatchValue {
    /// A command produced by the query/expression layer
    Command(Box<dyn Command>),
    /// A reference to an existing batch variable
    Variable(BatchVariable),
    /// A literal value, converted to dialect text
    Literal(Value),
}

impl BatchValue {
    /// Render to the statement text placed after `LET key = `
    pub fn render(&self) -> String {
        match self {
            BatchValue::Command(command) => command.render(),
            BatchValue::Variable(variable) => variable.reference(),
            BatchValue::Literal(value) => render_literal(value),
        }
    }

    /// The kind the bound variable receives
    pub fn kind(&self) -> VariableKind {
        match self {
            BatchValue::Command(command) => command.kind().into(),
            BatchValue::Variable(variable) => variable.kind(),
            BatchValue::Literal(_) => VariableKind::Plain,
        }
    }
}

impl From<Box<dyn Command>> for BatchValue {
    fn from(command: Box<dyn Command>) -> Self {
        BatchValue::Command(command)
    }
}

impl<C: Command + 'static> From<C> for BatchValue {
    fn from(command: C) -> Self {
        BatchValue::Command(Box::new(command))
    }
}

impl From<BatchVariable> for BatchValue {
    fn from(variable: BatchVariable) -> Self {
        BatchValue::Variable(variable)
    }
}

impl From<Value> for BatchValue {
    fn from(value: Value) -> Self {
        BatchValue::Literal(value)
    }
}

impl From<&str> for BatchValue {
    fn from(value: &str) -> Self {
        BatchValue::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for BatchValue {
    fn from(value: String) -> Self {
        BatchValue::Literal(Value::String(value))
    }
}

impl From<i64> for BatchValue {
    fn from(value: i64) -> Self {
        BatchValue::Literal(Value::from(value))
    }
}

impl From<f64> for BatchValue {
    fn from(value: f64) -> Self {
        BatchValue::Literal(Value::from(value))
    }
}

impl From<bool> for BatchValue {
    fn from(value: bool) -> Self {
        BatchValue::Literal(Value::Bool(value))
    }
}
