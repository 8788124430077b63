// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Compiled graphs and their execution.
//!
//! A [`CompiledGraph`] is the immutable product of
//! [`StateGraph::compile`](crate::StateGraph::compile): nodes, edges, entry
//! point, schema, and the step ceiling. It is never mutated after
//! compilation; the only engine-owned mutable resource during a run is the
//! running [`StateRecord`](crate::StateRecord), held exclusively by the
//! executor between frontiers.

mod execution;

use std::collections::HashMap;

use crate::edge::{ConditionalEdge, Edge};
use crate::node::BoxedNode;
use crate::state::{StateRecord, StateSchema};

/// Default ceiling on frontier advances per run, the engine's only
/// protection against a router that never routes to END.
pub const DEFAULT_STEP_LIMIT: u32 = 10_000;

/// An immutable, executable workflow graph.
pub struct CompiledGraph {
    pub(crate) schema: StateSchema,
    pub(crate) nodes: HashMap<String, BoxedNode>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    pub(crate) entry_point: String,
    pub(crate) step_limit: u32,
    pub(crate) name: Option<String>,
}

impl CompiledGraph {
    pub(crate) fn new(
        schema: StateSchema,
        nodes: HashMap<String, BoxedNode>,
        edges: Vec<Edge>,
        conditional_edges: Vec<ConditionalEdge>,
        entry_point: String,
    ) -> Self {
        Self {
            schema,
            nodes,
            edges,
            conditional_edges,
            entry_point,
            step_limit: DEFAULT_STEP_LIMIT,
            name: None,
        }
    }

    /// Override the step ceiling (default [`DEFAULT_STEP_LIMIT`]).
    #[must_use]
    pub fn with_step_limit(mut self, limit: u32) -> Self {
        self.step_limit = limit;
        self
    }

    /// Label the graph's execution tracing span.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the entry point node name
    #[must_use]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Get the number of nodes in the graph
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of edges in the graph
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.conditional_edges.len()
    }

    /// The configured step ceiling.
    #[must_use]
    pub fn step_limit(&self) -> u32 {
        self.step_limit
    }
}

/// Final state plus execution metadata returned by
/// [`CompiledGraph::invoke`].
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The state after the last frontier merged.
    pub final_state: StateRecord,
    /// Every node executed, in frontier order.
    pub nodes_executed: Vec<String>,
    /// Number of frontier advances the run took.
    pub steps: u32,
}

impl ExecutionResult {
    /// The final state.
    #[must_use]
    pub fn state(&self) -> &StateRecord {
        &self.final_state
    }

    /// Consume the result, keeping only the final state.
    #[must_use]
    pub fn into_state(self) -> StateRecord {
        self.final_state
    }

    /// The execution path, in frontier order.
    #[must_use]
    pub fn execution_path(&self) -> &[String] {
        &self.nodes_executed
    }
}
