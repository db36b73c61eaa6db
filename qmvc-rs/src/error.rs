//! Crate-wide error type.
//!
//! Every failure during evaluation or synthesis is fatal: it propagates to
//! the caller of [`crate::project::process_project`] (or the evaluator entry
//! points) as a single [`Error`].  Nothing is retried or recovered locally.

use thiserror::Error;

/// Errors raised while evaluating project files or synthesizing output.
#[derive(Debug, Error)]
pub enum Error {
    /// A directive or predicate name (or its argument count) is not recognised.
    #[error("Unknown function call: {name} ({args} argument(s))")]
    UnknownDirective {
        /// Function name as written.
        name: String,
        /// Number of arguments supplied.
        args: usize,
    },

    /// An included file or subproject file could not be opened.
    #[error("Cannot open file: {path}: {source}")]
    MissingFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A single-valued variable held zero or several values.
    #[error("Variable {name} must hold exactly one value, found {count}")]
    Arity { name: String, count: usize },

    /// `TEMPLATE` named a project kind other than `app`, `lib` or `subdirs`.
    #[error("Unknown TEMPLATE: {0}")]
    UnknownTemplate(String),

    /// The project file text could not be turned into a statement tree.
    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// Include / subproject nesting exceeded the configured bound.
    #[error("Nesting deeper than {limit} levels while processing {path}")]
    RecursionLimit { path: String, limit: usize },

    /// A `~=` operand was not a usable `s/regex/replacement/` expression.
    #[error("Invalid substitution '{op}': {reason}")]
    InvalidSubstitution { op: String, reason: String },

    /// Writing an output document failed.
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ── Tests ─────────────────────────────────────────────────────────────────────
