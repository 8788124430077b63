// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Error types for Flowgraph.
//!
//! Configuration errors are raised only by [`StateGraph::compile`]
//! (or by node registration, for duplicates) and block compilation
//! entirely; run-time errors abort the in-flight run immediately and are
//! surfaced as a [`RunError`] carrying the offending detail plus the last
//! fully merged state. Messages name the builder method that fixes the
//! problem, so a failure is actionable without searching documentation.
//!
//! [`StateGraph::compile`]: crate::StateGraph::compile

use thiserror::Error;

use crate::state::StateRecord;

/// All failure modes of graph construction, compilation, and execution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Graph has no entry point
    #[error("Graph has no entry point defined. Call set_entry_point() before compile().")]
    NoEntryPoint,

    /// Node id already registered
    #[error("Node '{0}' already exists in graph")]
    DuplicateNode(String),

    /// An edge, route target, or the entry marker references an
    /// undeclared node id
    #[error("An edge references node '{0}', which was never registered")]
    DanglingEdge(String),

    /// Node not reachable from the entry point
    #[error("Node '{0}' is not reachable from the entry point")]
    UnreachableNode(String),

    /// Node with no structural path to the terminal marker
    #[error("Node '{0}' has no path to END. Add an edge or a route label targeting END downstream of it.")]
    MissingTerminal(String),

    /// Node referenced during execution is missing from the compiled graph
    #[error("Node '{0}' not found in graph")]
    NodeNotFound(String),

    /// A node body failed during a run
    #[error("Node execution error in '{node}': {source}")]
    NodeExecution {
        /// Name of the node that failed.
        node: String,
        /// The underlying error that occurred.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Conditional router returned a label outside its declared route map
    #[error("Conditional edge from '{node}' returned '{label}' but no route exists for it")]
    Routing {
        /// Source node of the conditional edge.
        node: String,
        /// The label the router returned.
        label: String,
    },

    /// APPEND merge policy applied against an incompatible value
    #[error("Cannot append to field '{field}': expected a sequence, found {found}")]
    MergeType {
        /// The state field being merged.
        field: String,
        /// Value class that was found instead of a sequence.
        found: &'static str,
    },

    /// Safety ceiling against runaway cycles
    #[error("Step limit of {limit} reached. Graph execution exceeded the maximum number of frontier advances; this usually indicates a non-terminating cycle. Use with_step_limit() to raise the ceiling if the workflow is legitimately that deep.")]
    StepLimitExceeded {
        /// The ceiling that was exceeded.
        limit: u32,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error, typically a collaborator failure wrapped by a node body
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Wrap an arbitrary message, the usual way node bodies surface
    /// collaborator failures.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    /// True for errors only graph construction/compilation can produce.
    /// These block compilation entirely, so no run is possible.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoEntryPoint
                | Self::DuplicateNode(_)
                | Self::DanglingEdge(_)
                | Self::UnreachableNode(_)
                | Self::MissingTerminal(_)
        )
    }
}

/// Result type for Flowgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run-time failure surfaced by [`CompiledGraph::invoke`].
///
/// Pairs the underlying [`Error`] with the last state that was fully merged
/// before the abort. The state is for diagnosis only: it is not a
/// resumable checkpoint, and it never contains partial output from the
/// frontier that failed.
///
/// [`CompiledGraph::invoke`]: crate::CompiledGraph::invoke
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RunError {
    /// What went wrong.
    #[source]
    pub source: Error,
    /// Last fully merged state before the abort.
    pub last_state: StateRecord,
}

impl RunError {
    pub(crate) fn new(source: Error, last_state: StateRecord) -> Self {
        Self { source, last_state }
    }

    /// The last fully merged state before the abort, for diagnosis.
    #[must_use]
    pub fn last_state(&self) -> &StateRecord {
        &self.last_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        assert!(Error::NoEntryPoint.is_configuration());
        assert!(Error::DuplicateNode("a".into()).is_configuration());
        assert!(Error::DanglingEdge("b".into()).is_configuration());
        assert!(Error::UnreachableNode("c".into()).is_configuration());
        assert!(Error::MissingTerminal("d".into()).is_configuration());

        assert!(!Error::StepLimitExceeded { limit: 10 }.is_configuration());
        assert!(!Error::Routing {
            node: "n".into(),
            label: "l".into()
        }
        .is_configuration());
        assert!(!Error::generic("boom").is_configuration());
    }

    #[test]
    fn run_error_displays_the_source() {
        let err = RunError::new(
            Error::Routing {
                node: "evaluate".into(),
                label: "maybe".into(),
            },
            StateRecord::new().with("iteration", 2),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("evaluate"));
        assert!(rendered.contains("maybe"));
        assert_eq!(err.last_state().get_i64("iteration"), Some(2));
    }
}
