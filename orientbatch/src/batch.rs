//! Batch builder core
//!
//! A [`Batch`] accumulates named, interdependent operations into a single
//! script for the server's batch dialect, submits it atomically through
//! the client collaborator, and decodes the record response using the
//! variable metadata recorded while building.
//!
//! A batch instance represents one logical transaction attempt at a time:
//! every commit-type operation snapshots the script, resets the builder
//! back to its leading `BEGIN` statement, and hands back either the
//! decoded result (immediate mode) or a [`CompiledBatch`] (compile mode).
//! Instances are not safe for concurrent use; callers serialize access,
//! one batch per in-flight transaction attempt.

use crate::client::{CacheHook, Materializer, ScriptClient};
use crate::command::{quote_string, render_literal, Command};
use crate::decode::{decode_response, BatchResult, ReturnShape};
use crate::deferred::{CompiledBatch, ScriptRunner};
use crate::error::{BatchError, Result};
use crate::registry::{BatchFactory, Registry};
use crate::sanitize;
use crate::script::ScriptBuffer;
use crate::variable::{BatchValue, BatchVariable, VariableKind};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Transaction consistency mode requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
}

impl IsolationLevel {
    /// The `BEGIN` statement opening a script at this level
    pub fn begin_statement(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "BEGIN",
            IsolationLevel::RepeatableRead => "BEGIN ISOLATION REPEATABLE_READ",
        }
    }
}

/// Construction options for a [`Batch`]
#[derive(Clone, Default)]
pub struct BatchOptions {
    pub isolation: IsolationLevel,
    /// Defer execution and return [`CompiledBatch`] objects from commits
    pub compile: bool,
    /// Cache hook forwarded to the client on every execution
    pub cache: Option<CacheHook>,
}

/// Options for [`Batch::collect`]
#[derive(Clone, Default)]
pub struct CollectOptions {
    /// Retry limit emitted as `COMMIT RETRY n` for the server to honor
    pub retries: Option<u32>,
    /// Fetch plan applied to the collecting query
    pub fetch_plan: Option<String>,
}

/// Target of a `RETURN` statement
pub enum ReturnTarget {
    /// A batch variable reference (rendered `$name`, name sanitized)
    Reference(String),
    /// A plain string, rendered as a quoted literal
    Literal(String),
    /// An ordered sequence of variable names, rendered `[$a,$b]`
    List(Vec<String>),
    /// Ordered key/variable pairs, rendered `{'k':$v,...}`
    Map(Vec<(String, String)>),
    /// A retrieval command, rendered as a parenthesized sub-query
    Query(Box<dyn Command>),
    /// Any other value, rendered as a dialect literal
    Value(Value),
}

impl From<&str> for ReturnTarget {
    fn from(s: &str) -> Self {
        match s.strip_prefix('$') {
            Some(name) => ReturnTarget::Reference(name.to_string()),
            None => ReturnTarget::Literal(s.to_string()),
        }
    }
}

impl From<String> for ReturnTarget {
    fn from(s: String) -> Self {
        ReturnTarget::from(s.as_str())
    }
}

impl From<Vec<&str>> for ReturnTarget {
    fn from(names: Vec<&str>) -> Self {
        ReturnTarget::List(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Box<dyn Command>> for ReturnTarget {
    fn from(command: Box<dyn Command>) -> Self {
        ReturnTarget::Query(command)
    }
}

impl From<Value> for ReturnTarget {
    fn from(value: Value) -> Self {
        ReturnTarget::Value(value)
    }
}

impl From<&BatchVariable> for ReturnTarget {
    fn from(variable: &BatchVariable) -> Self {
        ReturnTarget::Reference(variable.symbol().to_string())
    }
}

/// Render a `RETURN` target to dialect text
///
/// Variable names pass through the installed sanitizer; without one they
/// are taken verbatim, matching assignment.
fn render_return(target: &ReturnTarget) -> String {
    match target {
        ReturnTarget::Reference(name) => format!("${}", sanitize::apply(name)),
        ReturnTarget::Literal(s) => quote_string(s),
        ReturnTarget::List(names) => {
            let refs: Vec<String> = names
                .iter()
                .map(|name| format!("${}", sanitize::apply(name)))
                .collect();
            format!("[{}]", refs.join(","))
        }
        ReturnTarget::Map(pairs) => {
            let entries: Vec<String> = pairs
                .iter()
                .map(|(key, name)| format!("{}:${}", quote_string(key), sanitize::apply(name)))
                .collect();
            format!("{{{}}}", entries.join(","))
        }
        ReturnTarget::Query(command) => format!("({})", command.render()),
        ReturnTarget::Value(value) => render_literal(value),
    }
}

/// Outcome of a branch body, reported rather than propagated
#[derive(Debug)]
pub enum BranchOutcome {
    /// The body completed; its statements were merged into the parent
    Completed,
    /// The body failed; the branch emitted `ROLLBACK` and swallowed the
    /// error
    RolledBack(BatchError),
}

impl BranchOutcome {
    pub fn is_rolled_back(&self) -> bool {
        matches!(self, BranchOutcome::RolledBack(_))
    }
}

/// Condition guarding a branch
pub enum Condition {
    /// Already-rendered boolean expression text
    Text(String),
    /// An expression command rendered on use
    Command(Box<dyn Command>),
}

impl Condition {
    fn render(&self) -> String {
        match self {
            Condition::Text(text) => text.clone(),
            Condition::Command(command) => command.render(),
        }
    }
}

impl From<&str> for Condition {
    fn from(text: &str) -> Self {
        Condition::Text(text.to_string())
    }
}

impl From<String> for Condition {
    fn from(text: String) -> Self {
        Condition::Text(text)
    }
}

impl From<Box<dyn Command>> for Condition {
    fn from(command: Box<dyn Command>) -> Self {
        Condition::Command(command)
    }
}

/// What a commit-type operation hands back
pub enum BatchExecution {
    /// Immediate mode: the script ran and its response was decoded
    Completed(BatchResult),
    /// Compile mode: a deferred script with an armed executor
    Compiled(CompiledBatch),
}

impl BatchExecution {
    /// The decoded result of an immediate-mode commit
    pub fn result(self) -> Result<BatchResult> {
        match self {
            BatchExecution::Completed(result) => Ok(result),
            BatchExecution::Compiled(_) => Err(BatchError::Execution(
                "batch was built in compile mode; execute the compiled script instead".to_string(),
            )),
        }
    }

    /// The compiled script of a compile-mode commit
    pub fn compiled(self) -> Result<CompiledBatch> {
        match self {
            BatchExecution::Compiled(compiled) => Ok(compiled),
            BatchExecution::Completed(_) => Err(BatchError::Execution(
                "batch executed immediately; enable compile mode for deferred scripts".to_string(),
            )),
        }
    }
}

/// Batch-script builder and transaction coordinator
pub struct Batch {
    client: Arc<dyn ScriptClient>,
    materializer: Arc<dyn Materializer>,
    factories: HashMap<String, BatchFactory>,
    cache: Option<CacheHook>,
    buffer: ScriptBuffer,
    variables: HashMap<String, BatchVariable>,
    compile: bool,
    isolation: IsolationLevel,
}

impl Batch {
    /// Create a batch with default options and no registry
    pub fn new(client: Arc<dyn ScriptClient>, materializer: Arc<dyn Materializer>) -> Self {
        Batch::with_options(client, materializer, BatchOptions::default())
    }

    /// Create a batch with explicit options
    pub fn with_options(
        client: Arc<dyn ScriptClient>,
        materializer: Arc<dyn Materializer>,
        options: BatchOptions,
    ) -> Self {
        let mut buffer = ScriptBuffer::new();
        buffer.append(options.isolation.begin_statement());

        Batch {
            client,
            materializer,
            factories: HashMap::new(),
            cache: options.cache,
            buffer,
            variables: HashMap::new(),
            compile: options.compile,
            isolation: options.isolation,
        }
    }

    /// Create a batch exposing a command factory per registered class
    pub fn with_registry(
        client: Arc<dyn ScriptClient>,
        materializer: Arc<dyn Materializer>,
        registry: &Registry,
        options: BatchOptions,
    ) -> Self {
        let mut batch = Batch::with_options(client, materializer, options);
        for (name, descriptor) in registry.iter() {
            batch
                .factories
                .insert(name.to_string(), BatchFactory::new(name, descriptor));
        }
        batch
    }

    /// Command factory for a registered class
    pub fn factory(&self, name: &str) -> Result<&BatchFactory> {
        self.factories
            .get(name)
            .ok_or_else(|| BatchError::UnknownClass(name.to_string()))
    }

    /// Whether commits return [`CompiledBatch`] objects
    pub fn is_compile_mode(&self) -> bool {
        self.compile
    }

    /// Toggle compile mode for subsequent commits
    pub fn set_compile(&mut self, compile: bool) {
        self.compile = compile;
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// The script text accumulated so far (active block only)
    pub fn script_text(&self) -> String {
        self.buffer.current_text()
    }

    /// Bind a value or command to a named variable
    ///
    /// Appends `LET key = <rendered value>` and records the variable's
    /// kind for decoding. Reusing a key shadows the earlier binding for
    /// subsequent reads; earlier script lines stay valid since the
    /// dialect evaluates statements in order. The key passes through the
    /// installed sanitizer, or is taken verbatim without one.
    pub fn assign(&mut self, key: &str, value: impl Into<BatchValue>) {
        let value = value.into();
        let rendered = value.render();
        let key = sanitize::apply(key);

        self.buffer.append(format!("LET {} = {}", key, rendered));
        self.variables
            .insert(key.clone(), BatchVariable::new(key, value.kind(), rendered));
    }

    /// Append a command for its side effects only; no variable is bound
    pub fn run(&mut self, command: &dyn Command) {
        self.buffer.append(command.render());
    }

    /// Put the batch in wait for the given number of milliseconds
    pub fn sleep(&mut self, ms: u64) {
        self.buffer.append(format!("sleep {}", ms));
    }

    /// Reference a previously bound variable without committing
    ///
    /// Returns a copy: independent identity, shared symbol/kind/source.
    /// Without an installed sanitizer, a name the dialect would reject
    /// fails with [`BatchError::InvalidName`] instead of silently
    /// missing.
    pub fn variable(&self, name: &str) -> Result<BatchVariable> {
        let key = match sanitize::name_sanitizer() {
            Some(sanitizer) => sanitizer.sanitize(name),
            None => {
                if !sanitize::is_valid_name(name) {
                    return Err(BatchError::InvalidName(name.to_string()));
                }
                name.to_string()
            }
        };
        self.variables
            .get(&key)
            .cloned()
            .ok_or(BatchError::VariableNotFound(key))
    }

    /// Conditionally execute statements built by `body`
    ///
    /// The body's statements land in a nested block merged into a single
    /// `if (<condition>) { ... }` line on exit. A failing body does not
    /// abort script assembly: the branch appends `ROLLBACK` in its
    /// place and reports the swallowed error in the outcome. In compile
    /// mode the braces are doubled so a later format pass keeps them
    /// literal.
    pub fn branch<F>(&mut self, condition: impl Into<Condition>, body: F) -> BranchOutcome
    where
        F: FnOnce(&mut Batch) -> Result<()>,
    {
        let condition = condition.into();
        self.buffer.push_block();

        let outcome = match body(self) {
            Ok(()) => BranchOutcome::Completed,
            Err(err) => {
                log::warn!("branch body failed, emitting ROLLBACK: {}", err);
                self.buffer.append("ROLLBACK");
                BranchOutcome::RolledBack(err)
            }
        };

        let statements = self.buffer.pop_block().join("\n");
        let rendered = condition.render();
        let merged = if self.compile {
            format!("if ({}) {{{{\n  {}\n}}}}", rendered, statements)
        } else {
            format!("if ({}) {{\n  {}\n}}", rendered, statements)
        };
        self.buffer.append(merged);

        outcome
    }

    /// Commit with no return value
    ///
    /// Emits `COMMIT`, or `COMMIT RETRY n` with a retry limit for the
    /// server to honor in the event of concurrent modification.
    pub fn commit(&mut self, retries: Option<u32>) -> Result<BatchExecution> {
        self.buffer.append(commit_statement(retries));
        self.finalize(ReturnShape::Discard)
    }

    /// Commit and return a value from the script
    pub fn commit_returning(
        &mut self,
        target: impl Into<ReturnTarget>,
        retries: Option<u32>,
    ) -> Result<BatchExecution> {
        let rendered = render_return(&target.into());
        self.buffer
            .append(format!("{}\nRETURN {}", commit_statement(retries), rendered));

        // Captured from the variable map before clear() destroys it.
        let set_kind = rendered
            .strip_prefix('$')
            .and_then(|name| self.variables.get(name))
            .map(|variable| variable.kind() == VariableKind::QueryResult)
            .unwrap_or(false);
        let collection_literal = rendered.starts_with('[') || rendered.starts_with('{');

        self.finalize(ReturnShape::Value {
            collection_literal,
            set_kind,
        })
    }

    /// Commit, collecting several batch variables in one response
    ///
    /// The dialect cannot expand multiple independent result sets in one
    /// query, so each variable's set is prefixed with its record count
    /// and the runs are concatenated through a single `unionall`:
    /// `[count_a, a1..aN, count_b, b1..bM, ...]`. Decoding slices the
    /// flat response back into a per-variable map. Duplicate names are
    /// ignored; enumeration keeps first-occurrence order.
    pub fn collect(&mut self, names: &[&str], options: CollectOptions) -> Result<BatchExecution> {
        let mut ordered: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !ordered.iter().any(|seen| seen == name) {
                ordered.push((*name).to_string());
            }
        }

        for name in &ordered {
            self.buffer.append(format!(
                "LET _{0} = SELECT ${0}.size() as size",
                name
            ));
        }

        self.buffer.append(commit_statement(options.retries));

        let union: Vec<String> = ordered
            .iter()
            .map(|name| format!("$_{0},${0}", name))
            .collect();
        let fetch = options
            .fetch_plan
            .as_deref()
            .map(|plan| format!(" FETCHPLAN {}", plan))
            .unwrap_or_default();
        self.buffer.append(format!(
            "RETURN (SELECT expand(unionall({})){})",
            union.join(","),
            fetch
        ));

        self.finalize(ReturnShape::Collected { names: ordered })
    }

    /// Reset to the initial state for a new set of commands
    ///
    /// Empties the variable map and truncates the base block to its
    /// leading `BEGIN` statement. Called automatically after every
    /// commit-type operation.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.buffer.reset();
    }

    /// Snapshot the script, reset the builder, then execute or defer
    ///
    /// The response shape is captured by the caller before this point
    /// because `clear()` destroys the variable map the shape depends on.
    fn finalize(&mut self, shape: ReturnShape) -> Result<BatchExecution> {
        let script = self.buffer.current_text();
        self.clear();

        log::debug!("finalized batch script:\n{}", script);

        let client = Arc::clone(&self.client);
        let materializer = Arc::clone(&self.materializer);
        let cache = self.cache.clone();

        if self.compile {
            let mut compiled = CompiledBatch::new(script);
            let runner: ScriptRunner = Box::new(move |text: &str| {
                let records = client.execute_script(text, cache.as_ref())?;
                decode_response(&shape, &records, materializer.as_ref(), cache.as_ref())
            });
            compiled.arm(runner);
            Ok(BatchExecution::Compiled(compiled))
        } else {
            let records = client.execute_script(&script, cache.as_ref())?;
            let result = decode_response(&shape, &records, materializer.as_ref(), cache.as_ref())?;
            Ok(BatchExecution::Completed(result))
        }
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.buffer.current_text())
    }
}

fn commit_statement(retries: Option<u32>) -> String {
    match retries {
        Some(n) => format!("COMMIT RETRY {}", n),
        None => "COMMIT".to_string(),
    }
}
