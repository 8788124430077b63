// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! The node contract: a unit of work consuming a state snapshot and
//! producing a partial update.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::state::{StateRecord, StateUpdate};

/// A unit of work in the graph.
///
/// Nodes receive an owned snapshot of the running state and communicate
/// results only through the [`StateUpdate`] they return, never through
/// shared mutable state. Siblings in a parallel frontier all see the same
/// snapshot; none observes another's output before the frontier merges.
///
/// Most workflows register closures via
/// [`StateGraph::add_node_from_fn`](crate::StateGraph::add_node_from_fn);
/// implement this trait directly when the node carries its own
/// dependencies (service handles, prompt templates, ...).
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute against `snapshot` and return the fields this step changes.
    async fn run(&self, snapshot: StateRecord) -> Result<StateUpdate>;
}

/// Shared handle under which the graph stores registered nodes.
pub(crate) type BoxedNode = Arc<dyn Node>;

/// Adapter wrapping closure nodes registered through `add_node_from_fn`.
pub(crate) struct FnNode<F> {
    f: F,
}

impl<F> FnNode<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Node for FnNode<F>
where
    F: Fn(StateRecord) -> BoxFuture<'static, Result<StateUpdate>> + Send + Sync,
{
    async fn run(&self, snapshot: StateRecord) -> Result<StateUpdate> {
        (self.f)(snapshot).await
    }
}
