// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Flowgraph, a stateful directed-graph workflow engine.
//!
//! Workflows are directed graphs of nodes executing over one shared
//! [`StateRecord`]. The engine supports sequential chains, parallel
//! fan-out/fan-in with field-level merge reducers, conditional branching
//! decided at run time, and cyclic iteration bounded by a step ceiling.
//!
//! - [`StateSchema`] declares each field's merge policy (OVERWRITE or
//!   APPEND) once, up front.
//! - [`StateGraph`] registers nodes and edges; [`StateGraph::compile`]
//!   validates the structure (reachability, dangling references, a path to
//!   [`END`] for every node) and freezes it into a [`CompiledGraph`].
//! - [`CompiledGraph::invoke`] runs the graph: each traversal step
//!   dispatches a whole frontier of nodes concurrently against an
//!   identical state snapshot, waits for all of them, merges their partial
//!   updates in branch-registration order, and routes to the next
//!   frontier until every live path reaches [`END`].
//!
//! # Example
//!
//! ```no_run
//! use flowgraph::{MergePolicy, StateGraph, StateRecord, StateSchema, StateUpdate, END};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = StateSchema::new().field("scores", MergePolicy::Append);
//!     let mut graph = StateGraph::new(schema);
//!
//!     graph.add_node_from_fn("score", |state| {
//!         Box::pin(async move {
//!             let n = state.get_i64("n").unwrap_or(0);
//!             Ok(StateUpdate::new().set("scores", json!([n * 2])))
//!         })
//!     })?;
//!     graph.set_entry_point("score");
//!     graph.add_edge("score", END);
//!
//!     let app = graph.compile()?;
//!     let result = app.invoke(StateRecord::new().with("n", 21)).await?;
//!     println!("scores: {:?}", result.state().get_array("scores"));
//!     Ok(())
//! }
//! ```

pub mod edge;
pub mod error;
pub mod executor;
pub mod graph;
pub mod merge;
pub mod node;
pub mod service;
pub mod state;

pub use edge::{END, START};
pub use error::{Error, Result, RunError};
pub use executor::{CompiledGraph, ExecutionResult, DEFAULT_STEP_LIMIT};
pub use graph::StateGraph;
pub use node::Node;
pub use service::{InteractiveInputService, ResultShape, TextGenerationService};
pub use state::{MergePolicy, StateRecord, StateSchema, StateUpdate};
