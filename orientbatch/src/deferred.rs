//! Compiled batches: deferred formatting and execution
//!
//! In compile mode a commit does not run the script. It returns a
//! [`CompiledBatch`] holding the script text as a template with
//! substitution placeholders, plus an armed executor. The template is
//! formatted at execution time, not build time, so one compiled script
//! can be reused with fresh substitution values.

use crate::command::render_literal;
use crate::decode::BatchResult;
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Executes a formatted script and decodes its response
pub(crate) type ScriptRunner = Box<dyn FnMut(&str) -> Result<BatchResult> + Send>;

enum ExecutorState {
    Armed(ScriptRunner),
    Exhausted,
}

/// A not-yet-run batch script with an interchangeable executor
///
/// The executor is an explicit two-state machine: while armed,
/// [`execute`](CompiledBatch::execute) runs the currently formatted text
/// and may be called again after reformatting; once exhausted (via
/// [`disarm`](CompiledBatch::disarm), or when built without an executor)
/// every call returns `None`. "Already executed" is not an error.
/// Rebuilding the batch produces a freshly armed instance.
pub struct CompiledBatch {
    template: String,
    formatted: Option<String>,
    state: ExecutorState,
}

impl CompiledBatch {
    pub(crate) fn new(template: String) -> Self {
        CompiledBatch {
            template,
            formatted: None,
            state: ExecutorState::Exhausted,
        }
    }

    pub(crate) fn arm(&mut self, runner: ScriptRunner) {
        self.state = ExecutorState::Armed(runner);
    }

    /// The raw template, placeholders intact
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the executor can still run
    pub fn is_armed(&self) -> bool {
        matches!(self.state, ExecutorState::Armed(_))
    }

    /// Drop the executor; subsequent `execute` calls return `None`
    pub fn disarm(&mut self) {
        self.state = ExecutorState::Exhausted;
    }

    /// The formatted script text, formatting with no arguments on first use
    pub fn text(&mut self) -> &str {
        if self.formatted.is_none() {
            self.formatted = Some(substitute(&self.template, &[], &HashMap::new()));
        }
        self.formatted.as_deref().unwrap_or(&self.template)
    }

    /// Fill positional placeholders with fresh arguments
    ///
    /// Arguments are encoded as dialect literals. The result is cached:
    /// calling again with no arguments returns the cached text, while a
    /// non-empty argument list reformats from the template.
    pub fn format(&mut self, args: &[Value]) -> &str {
        if self.formatted.is_none() || !args.is_empty() {
            let positional: Vec<String> = args.iter().map(render_literal).collect();
            self.formatted = Some(substitute(&self.template, &positional, &HashMap::new()));
        }
        self.formatted.as_deref().unwrap_or(&self.template)
    }

    /// Fill named placeholders with fresh arguments
    pub fn format_named(&mut self, args: &[(&str, Value)]) -> &str {
        if self.formatted.is_none() || !args.is_empty() {
            let named: HashMap<String, String> = args
                .iter()
                .map(|(name, value)| (name.to_string(), render_literal(value)))
                .collect();
            self.formatted = Some(substitute(&self.template, &[], &named));
        }
        self.formatted.as_deref().unwrap_or(&self.template)
    }

    /// Run the armed executor against the currently formatted text
    pub fn execute(&mut self) -> Option<Result<BatchResult>> {
        // Materialize the formatted text before borrowing the runner.
        let text = self.text().to_string();
        match &mut self.state {
            ExecutorState::Armed(runner) => Some(runner(&text)),
            ExecutorState::Exhausted => None,
        }
    }
}

/// Replace `{}` / `{name}` / `{0}` placeholders, `str.replace`-style
///
/// Doubled braces unescape to literal braces. Placeholders with no
/// matching argument are left verbatim, so a template can be formatted
/// in several passes.
fn substitute(template: &str, positional: &[String], named: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_positional = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    out.push('{');
                    out.push_str(&name);
                    continue;
                }

                let replacement = if name.is_empty() {
                    let arg = positional.get(next_positional);
                    next_positional += 1;
                    arg.cloned()
                } else if let Ok(index) = name.parse::<usize>() {
                    positional.get(index).cloned()
                } else {
                    named.get(&name).cloned()
                };

                match replacement {
                    Some(text) => out.push_str(&text),
                    None => {
                        out.push('{');
                        out.push_str(&name);
                        out.push('}');
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}
