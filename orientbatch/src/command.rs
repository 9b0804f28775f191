//! Command text fragments and dialect literal rendering
//!
//! Commands are produced by the query/expression layer, which is an
//! external collaborator: the batch builder only needs two things from a
//! command, its rendered text and its [`CommandKind`]. The kind decides
//! how the variable bound to the command decodes later (a retrieval's
//! response is always a record set; a single created vertex unwraps to
//! one object).

use serde_json::Value;
use std::fmt;

/// Classification of a command, driving the bound variable's kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Creates a vertex (`CREATE VERTEX ...`)
    CreateVertex,
    /// Creates an edge (`CREATE EDGE ...`)
    CreateEdge,
    /// Any retrieval or query command (`SELECT ...`, `TRAVERSE ...`)
    Retrieval,
}

/// A rendered statement fragment for the batch scripting dialect
pub trait Command: Send + Sync {
    /// Render this command to dialect text
    fn render(&self) -> String;

    /// The command's classification
    fn kind(&self) -> CommandKind;
}

/// Plain text command carrier
///
/// The query builder collaborator produces its own [`Command`]
/// implementations; `ScriptCommand` is the minimal concrete one, holding
/// already-rendered text plus a kind tag.
#[derive(Debug, Clone)]
pub struct ScriptCommand {
    text: String,
    kind: CommandKind,
}

impl ScriptCommand {
    pub fn new(text: impl Into<String>, kind: CommandKind) -> Self {
        ScriptCommand {
            text: text.into(),
            kind,
        }
    }

    /// A vertex-creation command from rendered text
    pub fn create_vertex(text: impl Into<String>) -> Self {
        ScriptCommand::new(text, CommandKind::CreateVertex)
    }

    /// An edge-creation command from rendered text
    pub fn create_edge(text: impl Into<String>) -> Self {
        ScriptCommand::new(text, CommandKind::CreateEdge)
    }

    /// A retrieval command from rendered text
    pub fn retrieval(text: impl Into<String>) -> Self {
        ScriptCommand::new(text, CommandKind::Retrieval)
    }
}

impl Command for ScriptCommand {
    fn render(&self) -> String {
        self.text.clone()
    }

    fn kind(&self) -> CommandKind {
        self.kind
    }
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Render a JSON value as a dialect literal
///
/// Strings are single-quoted with backslash escaping, sequences become
/// bracketed lists, maps become brace-delimited key:value sets. Numbers,
/// booleans and null render verbatim.
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_string(s),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_literal).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", quote_string(k), render_literal(v)))
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
    }
}

/// Single-quote a string for the scripting dialect
pub fn quote_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 2);
    escaped.push('\'');
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(c),
        }
    }
    escaped.push('\'');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_command_render() {
        let cmd = ScriptCommand::create_vertex("CREATE VERTEX Person SET name = 'Bob'");
        assert_eq!(cmd.render(), "CREATE VERTEX Person SET name = 'Bob'");
        assert_eq!(cmd.kind(), CommandKind::CreateVertex);
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render_literal(&json!(null)), "null");
        assert_eq!(render_literal(&json!(true)), "true");
        assert_eq!(render_literal(&json!(42)), "42");
        assert_eq!(render_literal(&json!(1.5)), "1.5");
        assert_eq!(render_literal(&json!("plain")), "'plain'");
    }

    #[test]
    fn test_render_string_escaping() {
        assert_eq!(render_literal(&json!("it's")), "'it\\'s'");
        assert_eq!(render_literal(&json!("a\\b")), "'a\\\\b'");
    }

    #[test]
    fn test_render_collections() {
        assert_eq!(render_literal(&json!([1, "a"])), "[1,'a']");
        assert_eq!(
            render_literal(&json!({"name": "Ada", "age": 36})),
            "{'age':36,'name':'Ada'}"
        );
    }
}
