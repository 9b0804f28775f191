//! Ordered, nestable statement buffer
//!
//! Statements accumulate in a stack of blocks. The bottom block is the
//! top-level script; conditional bodies push a nested block and pop it
//! back off on scope exit. Only the active (top) block is visible when
//! rendering, so nested blocks must be popped before a top-level commit.

/// Stack of statement lists making up a script under construction
#[derive(Debug, Default)]
pub struct ScriptBuffer {
    stack: Vec<Vec<String>>,
}

impl ScriptBuffer {
    /// Create a buffer with a single, empty base block
    pub fn new() -> Self {
        ScriptBuffer {
            stack: vec![Vec::new()],
        }
    }

    /// Append a statement to the active block
    ///
    /// No validation is performed; the caller guarantees a well-formed
    /// statement fragment.
    pub fn append(&mut self, statement: impl Into<String>) {
        self.top_mut().push(statement.into());
    }

    /// Open a nested block
    pub fn push_block(&mut self) {
        self.stack.push(Vec::new());
    }

    /// Close the active block, returning its statements
    ///
    /// The base block is never popped; closing it returns an empty list
    /// so the `stack.len() >= 1` invariant holds unconditionally.
    pub fn pop_block(&mut self) -> Vec<String> {
        if self.stack.len() > 1 {
            self.stack.pop().unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    /// Number of open blocks (always at least 1)
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Statements of the active block
    pub fn top(&self) -> &[String] {
        self.stack.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render the active block, newline-joined
    pub fn current_text(&self) -> String {
        self.top().join("\n")
    }

    /// Reset to a single base block truncated to its first statement
    ///
    /// Used by `Batch::clear` to keep the leading `BEGIN` line while
    /// discarding everything built since.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
        if let Some(base) = self.stack.first_mut() {
            base.truncate(1);
        }
    }

    fn top_mut(&mut self) -> &mut Vec<String> {
        if self.stack.is_empty() {
            // Unreachable through the public API; restore the invariant
            // rather than panic.
            self.stack.push(Vec::new());
        }
        self.stack.last_mut().unwrap()
    }
}
