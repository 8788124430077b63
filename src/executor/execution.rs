// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

// Concurrent frontier execution clones Arc handles and state snapshots
// extensively; clippy's clone_on_ref_ptr is noise here.
#![allow(clippy::clone_on_ref_ptr)]

//! Execution methods for `CompiledGraph`.
//!
//! The run loop advances one frontier at a time: take an immutable
//! snapshot, dispatch every frontier member concurrently against it, wait
//! for all of them (barrier join), fold the partial updates into the
//! running state in branch-registration order, then resolve each member's
//! outgoing edge to form the next frontier. No two frontiers are ever in
//! flight simultaneously.

use std::collections::HashSet;

use tracing::{debug, info_span, Instrument, Span};
use uuid::Uuid;

use super::{CompiledGraph, ExecutionResult};
use crate::edge::END;
use crate::error::{Error, Result, RunError};
use crate::merge;
use crate::node::BoxedNode;
use crate::state::{StateRecord, StateUpdate};

impl CompiledGraph {
    /// Invoke the graph with an initial state.
    ///
    /// Executes from the entry point until every live path has reached
    /// [`END`], then returns the final state with execution metadata.
    /// Awaiting the returned future drives the whole run to completion;
    /// parallelism inside a frontier is internal to the engine.
    ///
    /// # Errors
    ///
    /// A [`RunError`] pairing the failure with the last fully merged state:
    ///
    /// - [`Error::NodeExecution`]: a node body failed; the failing
    ///   frontier's output, including successful siblings, is discarded
    /// - [`Error::Routing`]: a router returned a label outside its
    ///   declared route map
    /// - [`Error::MergeType`]: an APPEND field met a non-sequence value
    /// - [`Error::StepLimitExceeded`]: the safety ceiling tripped
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let result = app.invoke(StateRecord::new().with("topic", "rust")).await?;
    /// println!("final state: {:?}", result.state());
    /// println!("path: {:?}", result.execution_path());
    /// ```
    pub async fn invoke(
        &self,
        initial_state: StateRecord,
    ) -> std::result::Result<ExecutionResult, RunError> {
        // Unique request id so node spans correlate to one invocation.
        let request_id = Uuid::new_v4();
        let graph_name = self.name.as_deref().unwrap_or("graph");
        let span = info_span!(
            "graph.invoke",
            request_id = %request_id,
            graph.name = graph_name,
            graph.entry_point = %self.entry_point,
            graph.steps = tracing::field::Empty,
            graph.nodes_executed = tracing::field::Empty,
        );

        async move {
            let mut state = initial_state;
            let mut frontier = vec![self.entry_point.clone()];
            let mut nodes_executed: Vec<String> = Vec::with_capacity(16);
            let mut steps: u32 = 0;

            while !frontier.is_empty() {
                steps += 1;
                if steps > self.step_limit {
                    return Err(RunError::new(
                        Error::StepLimitExceeded {
                            limit: self.step_limit,
                        },
                        state,
                    ));
                }

                // Every sibling runs against this identical snapshot; none
                // observes a partial merge from its own frontier.
                let updates = match self.run_frontier(&frontier, &state).await {
                    Ok(updates) => updates,
                    Err(e) => return Err(RunError::new(e, state)),
                };
                nodes_executed.extend(frontier.iter().cloned());

                // Registration-order fold, all-or-nothing per frontier.
                state = match merge::apply_updates(&self.schema, &state, &updates) {
                    Ok(merged) => merged,
                    Err(e) => return Err(RunError::new(e, state)),
                };
                debug!(step = steps, frontier = ?frontier, "frontier merged");

                frontier = match self.next_frontier(&frontier, &state) {
                    Ok(next) => next,
                    Err(e) => return Err(RunError::new(e, state)),
                };
            }

            Span::current().record("graph.steps", i64::from(steps));
            Span::current().record("graph.nodes_executed", nodes_executed.len() as i64);

            Ok(ExecutionResult {
                final_state: state,
                nodes_executed,
                steps,
            })
        }
        .instrument(span)
        .await
    }

    /// Dispatch every node in `frontier` concurrently against the same
    /// snapshot and wait for the full set (barrier join), with no
    /// first-completion short-circuiting. Returned updates are in frontier
    /// (registration) order. The first failure in registration order wins;
    /// its siblings' output is discarded with it.
    async fn run_frontier(
        &self,
        frontier: &[String],
        state: &StateRecord,
    ) -> Result<Vec<StateUpdate>> {
        if let [only] = frontier {
            // Single-node frontier: run inline, no task spawn.
            let node = self.node(only)?;
            let update = node
                .run(state.clone())
                .instrument(info_span!("node.run", node = %only))
                .await
                .map_err(|e| Error::NodeExecution {
                    node: only.clone(),
                    source: Box::new(e),
                })?;
            return Ok(vec![update]);
        }

        let mut tasks = Vec::with_capacity(frontier.len());
        for name in frontier {
            let node = self.node(name)?;
            let snapshot = state.clone();
            let span = info_span!("node.run", node = %name);
            tasks.push(tokio::spawn(
                async move { node.run(snapshot).await }.instrument(span),
            ));
        }

        // Barrier: every sibling completes before any result is inspected.
        let mut results = Vec::with_capacity(tasks.len());
        for (name, task) in frontier.iter().zip(tasks) {
            let result = match task.await {
                Ok(update) => update,
                Err(e) => Err(Error::Generic(format!("node task panicked: {e}"))),
            };
            results.push((name, result));
        }

        let mut updates = Vec::with_capacity(results.len());
        for (name, result) in results {
            match result {
                Ok(update) => updates.push(update),
                Err(e) => {
                    return Err(Error::NodeExecution {
                        node: name.clone(),
                        source: Box::new(e),
                    })
                }
            }
        }
        Ok(updates)
    }

    /// Resolve each frontier member's outgoing edge against the just-merged
    /// state. Targets are deduplicated preserving declaration order (that
    /// is how fan-in converges to one node) and [`END`] drops out, so the
    /// run terminates when the returned frontier is empty.
    fn next_frontier(&self, frontier: &[String], state: &StateRecord) -> Result<Vec<String>> {
        let mut next = Vec::new();
        let mut seen = HashSet::new();
        for name in frontier {
            for target in self.successors(name, state)? {
                if target != END && seen.insert(target.clone()) {
                    next.push(target);
                }
            }
        }
        Ok(next)
    }

    /// Outgoing targets of one node: the conditional router's resolved
    /// label (conditional edges take precedence), or every static edge
    /// target in declaration order.
    fn successors(&self, node: &str, state: &StateRecord) -> Result<Vec<String>> {
        if let Some(cond) = self.conditional_edges.iter().find(|e| e.from == node) {
            let label = cond.evaluate(state);
            let target = cond.routes.get(&label).ok_or_else(|| Error::Routing {
                node: node.to_string(),
                label: label.clone(),
            })?;
            return Ok(vec![target.clone()]);
        }
        Ok(self
            .edges
            .iter()
            .filter(|e| e.from == node)
            .map(|e| e.to.clone())
            .collect())
    }

    fn node(&self, name: &str) -> Result<BoxedNode> {
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NodeNotFound(name.to_string()))
    }
}
