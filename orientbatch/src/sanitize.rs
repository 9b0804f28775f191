//! Variable name sanitization
//!
//! The scripting dialect only accepts variable names made of word
//! characters that do not start with a digit. Sanitization is a
//! process-wide strategy rather than per-batch configuration: every
//! script generated by the process must agree on how a user-supplied
//! name was rewritten, otherwise a reference emitted by one batch would
//! not resolve against a `LET` emitted by another.
//!
//! Install a sanitizer once at startup with [`set_name_sanitizer`].
//! Without one, names are taken verbatim on assignment, and reading back
//! a name containing forbidden characters fails with
//! [`BatchError::InvalidName`](crate::error::BatchError::InvalidName).

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{Arc, RwLock};

/// Strategy rewriting a user-supplied name into one the dialect accepts
pub trait NameSanitizer: Send + Sync {
    fn sanitize(&self, name: &str) -> String;
}

/// Process-wide sanitizer hook
///
/// Initialized once per process and shared by every batch instance.
/// Expected to be set during startup, not concurrently with batch
/// construction.
static NAME_SANITIZER: Lazy<RwLock<Option<Arc<dyn NameSanitizer>>>> =
    Lazy::new(|| RwLock::new(None));

/// Install the process-wide name sanitizer
///
/// Affects all batches from this point forward.
pub fn set_name_sanitizer(sanitizer: Arc<dyn NameSanitizer>) {
    let mut hook = NAME_SANITIZER
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *hook = Some(sanitizer);
}

/// The currently installed sanitizer, if any
pub fn name_sanitizer() -> Option<Arc<dyn NameSanitizer>> {
    NAME_SANITIZER
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Apply the installed sanitizer, or return the name verbatim
pub(crate) fn apply(name: &str) -> String {
    match name_sanitizer() {
        Some(sanitizer) => sanitizer.sanitize(name),
        None => name.to_string(),
    }
}

/// Matches a leading digit or any character the dialect forbids in names
/// (whitespace, and punctuation other than underscore).
static FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d|\W").expect("forbidden-char pattern is valid"));

/// Check a name against the dialect's rules
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Default sanitizer: rewrites a leading digit and every forbidden
/// character to an underscore
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSanitizer;

impl NameSanitizer for DefaultSanitizer {
    fn sanitize(&self, name: &str) -> String {
        FORBIDDEN.replace_all(name, "_").into_owned()
    }
}
