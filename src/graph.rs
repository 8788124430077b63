// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Graph construction and compilation.
//!
//! [`StateGraph`] collects nodes and edges; forward references are allowed,
//! so declaration order never matters. [`StateGraph::compile`] performs the
//! structural validation and freezes the result into an executable
//! [`CompiledGraph`]. Validation is pure: router functions and node bodies
//! are never invoked here.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::edge::{ConditionalEdge, Edge, END};
use crate::error::{Error, Result};
use crate::executor::CompiledGraph;
use crate::node::{BoxedNode, FnNode, Node};
use crate::state::{StateRecord, StateSchema, StateUpdate};

/// Builder for a stateful workflow graph.
///
/// # Example
///
/// ```rust
/// use flowgraph::{StateGraph, StateSchema, StateUpdate, END};
///
/// let mut graph = StateGraph::new(StateSchema::new());
/// graph.add_node_from_fn("answer", |_state| {
///     Box::pin(async move { Ok(StateUpdate::new().set("answer", "42")) })
/// })?;
/// graph.set_entry_point("answer");
/// graph.add_edge("answer", END);
/// let app = graph.compile()?;
/// assert_eq!(app.node_count(), 1);
/// # Ok::<(), flowgraph::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct StateGraph {
    schema: StateSchema,
    nodes: HashMap<String, BoxedNode>,
    edges: Vec<Edge>,
    conditional_edges: Vec<ConditionalEdge>,
    entry_point: Option<String>,
}

impl StateGraph {
    /// Create an empty graph governed by `schema`.
    #[must_use]
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema,
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: Vec::new(),
            entry_point: None,
        }
    }

    /// Register a node under a unique id.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateNode`] if the id is already registered.
    pub fn add_node(&mut self, id: impl Into<String>, node: impl Node + 'static) -> Result<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        self.nodes.insert(id, Arc::new(node));
        Ok(())
    }

    /// Register a closure node.
    ///
    /// The closure receives an owned snapshot of the running state and
    /// returns a boxed future resolving to its partial update:
    ///
    /// ```rust,ignore
    /// graph.add_node_from_fn("researcher", |state| {
    ///     Box::pin(async move {
    ///         Ok(StateUpdate::new().set("notes", "..."))
    ///     })
    /// })?;
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateNode`] if the id is already registered.
    pub fn add_node_from_fn<F>(&mut self, id: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(StateRecord) -> BoxFuture<'static, Result<StateUpdate>> + Send + Sync + 'static,
    {
        self.add_node(id, FnNode::new(f))
    }

    /// Add an unconditional edge. `to` may be [`END`].
    ///
    /// Several edges leaving the same node fan out into a parallel
    /// frontier; their declaration order is the branch-registration order
    /// used by the merge contracts. Either endpoint may be declared later;
    /// endpoints are validated at [`compile`](Self::compile).
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
        });
    }

    /// Add a conditional edge.
    ///
    /// After `from`'s frontier merges, `router` is invoked against the
    /// merged state and its label is resolved through `routes`. Targets may
    /// be [`END`]. A label the router returns that is missing from `routes`
    /// is a run-time routing error, since routers are opaque and never invoked
    /// during compilation.
    pub fn add_conditional_edges<F>(
        &mut self,
        from: impl Into<String>,
        router: F,
        routes: HashMap<String, String>,
    ) where
        F: Fn(&StateRecord) -> String + Send + Sync + 'static,
    {
        self.conditional_edges.push(ConditionalEdge {
            from: from.into(),
            router: Arc::new(router),
            routes,
        });
    }

    /// Declare the single entry point reached from the virtual start marker.
    pub fn set_entry_point(&mut self, id: impl Into<String>) {
        self.entry_point = Some(id.into());
    }

    /// Entry point declared so far, if any.
    #[must_use]
    pub fn get_entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    /// Ids of the nodes registered so far.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Validate the graph and freeze it into an executable form.
    ///
    /// # Errors
    ///
    /// - [`Error::NoEntryPoint`]: `set_entry_point` was never called
    /// - [`Error::DanglingEdge`]: an edge endpoint, route target, or the
    ///   entry marker names an unregistered node
    /// - [`Error::UnreachableNode`]: a node cannot be reached from entry
    /// - [`Error::MissingTerminal`]: a node has no structural path to
    ///   [`END`] (this also rejects nodes with no outgoing edge at all)
    pub fn compile(self) -> Result<CompiledGraph> {
        let entry = self.entry_point.clone().ok_or(Error::NoEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(Error::DanglingEdge(entry));
        }

        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.from) {
                return Err(Error::DanglingEdge(edge.from.clone()));
            }
            if edge.to != END && !self.nodes.contains_key(&edge.to) {
                return Err(Error::DanglingEdge(edge.to.clone()));
            }
        }
        for cond in &self.conditional_edges {
            if !self.nodes.contains_key(&cond.from) {
                return Err(Error::DanglingEdge(cond.from.clone()));
            }
            for target in cond.routes.values() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(Error::DanglingEdge(target.clone()));
                }
            }
        }

        // Node names sorted once so validation failures are deterministic.
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();

        let reachable = self.reachable_from(&entry);
        if let Some(missing) = names.iter().find(|n| !reachable.contains(*n)) {
            return Err(Error::UnreachableNode((*missing).to_string()));
        }

        let can_finish = self.reaching_end();
        if let Some(stuck) = names.iter().find(|n| !can_finish.contains(*n)) {
            return Err(Error::MissingTerminal((*stuck).to_string()));
        }

        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            conditional_edges = self.conditional_edges.len(),
            entry_point = %entry,
            "graph compiled"
        );

        Ok(CompiledGraph::new(
            self.schema,
            self.nodes,
            self.edges,
            self.conditional_edges,
            entry,
        ))
    }

    /// Forward BFS over both edge kinds. [`END`] is a sink, never expanded.
    fn reachable_from<'a>(&'a self, entry: &'a str) -> HashSet<&'a str> {
        let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            successors
                .entry(edge.from.as_str())
                .or_default()
                .push(edge.to.as_str());
        }
        for cond in &self.conditional_edges {
            let targets = successors.entry(cond.from.as_str()).or_default();
            targets.extend(cond.routes.values().map(String::as_str));
        }

        let mut visited = HashSet::from([entry]);
        let mut queue = VecDeque::from([entry]);
        while let Some(current) = queue.pop_front() {
            for &next in successors.get(current).into_iter().flatten() {
                if next != END && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Reverse BFS from [`END`]: the set of nodes with a structural path to
    /// the terminal marker. Structural only: a cycle on the path can still
    /// spin forever at run time; that is the step ceiling's problem.
    fn reaching_end(&self) -> HashSet<&str> {
        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            predecessors
                .entry(edge.to.as_str())
                .or_default()
                .push(edge.from.as_str());
        }
        for cond in &self.conditional_edges {
            for target in cond.routes.values() {
                predecessors
                    .entry(target.as_str())
                    .or_default()
                    .push(cond.from.as_str());
            }
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([END]);
        while let Some(current) = queue.pop_front() {
            for &prev in predecessors.get(current).into_iter().flatten() {
                if visited.insert(prev) {
                    queue.push_back(prev);
                }
            }
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(mut graph: StateGraph, id: &str) -> StateGraph {
        graph
            .add_node_from_fn(id, |_state| Box::pin(async move { Ok(StateUpdate::new()) }))
            .unwrap();
        graph
    }

    fn graph_with(ids: &[&str]) -> StateGraph {
        ids.iter()
            .fold(StateGraph::new(StateSchema::new()), |g, id| noop(g, id))
    }

    #[test]
    fn duplicate_node_is_rejected_at_registration() {
        let mut graph = graph_with(&["a"]);
        let err = graph
            .add_node_from_fn("a", |_state| Box::pin(async move { Ok(StateUpdate::new()) }))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNode(id) if id == "a"));
    }

    #[test]
    fn missing_entry_point_fails_compile() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge("a", END);
        assert!(matches!(graph.compile(), Err(Error::NoEntryPoint)));
    }

    #[test]
    fn unknown_entry_point_is_a_dangling_reference() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("ghost");
        graph.add_edge("a", END);
        assert!(matches!(graph.compile(), Err(Error::DanglingEdge(id)) if id == "ghost"));
    }

    #[test]
    fn dangling_edge_target_fails_compile() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("a");
        graph.add_edge("a", "ghost");
        assert!(matches!(graph.compile(), Err(Error::DanglingEdge(id)) if id == "ghost"));
    }

    #[test]
    fn dangling_route_target_fails_compile() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("a");
        graph.add_conditional_edges(
            "a",
            |_state| "go".to_string(),
            HashMap::from([("go".to_string(), "ghost".to_string())]),
        );
        assert!(matches!(graph.compile(), Err(Error::DanglingEdge(id)) if id == "ghost"));
    }

    #[test]
    fn unreachable_node_fails_compile() {
        let mut graph = graph_with(&["a", "island"]);
        graph.set_entry_point("a");
        graph.add_edge("a", END);
        graph.add_edge("island", END);
        assert!(matches!(graph.compile(), Err(Error::UnreachableNode(id)) if id == "island"));
    }

    #[test]
    fn node_without_path_to_end_fails_compile() {
        let mut graph = graph_with(&["a", "sink"]);
        graph.set_entry_point("a");
        graph.add_edge("a", "sink");
        // "sink" has no outgoing edge at all
        assert!(matches!(graph.compile(), Err(Error::MissingTerminal(id)) if id == "sink"));
    }

    #[test]
    fn cycle_with_no_exit_fails_compile() {
        let mut graph = graph_with(&["a", "b"]);
        graph.set_entry_point("a");
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        assert!(matches!(graph.compile(), Err(Error::MissingTerminal(_))));
    }

    #[test]
    fn cycle_with_a_conditional_exit_compiles() {
        let mut graph = graph_with(&["generate", "evaluate", "optimize"]);
        graph.set_entry_point("generate");
        graph.add_edge("generate", "evaluate");
        graph.add_conditional_edges(
            "evaluate",
            |_state| "approved".to_string(),
            HashMap::from([
                ("approved".to_string(), END.to_string()),
                ("needs_improvement".to_string(), "optimize".to_string()),
            ]),
        );
        graph.add_edge("optimize", "evaluate");
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn forward_references_are_allowed() {
        let mut graph = StateGraph::new(StateSchema::new());
        // edge declared before either endpoint exists
        graph.add_edge("a", "b");
        let mut graph = noop(noop(graph, "a"), "b");
        graph.set_entry_point("a");
        graph.add_edge("b", END);
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn compile_never_invokes_routers() {
        let mut graph = graph_with(&["a", "b"]);
        graph.set_entry_point("a");
        graph.add_conditional_edges(
            "a",
            |_state: &StateRecord| -> String { panic!("router invoked at compile time") },
            HashMap::from([
                ("go".to_string(), "b".to_string()),
                ("stop".to_string(), END.to_string()),
            ]),
        );
        graph.add_edge("b", END);
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn fan_out_and_fan_in_compiles() {
        let mut graph = graph_with(&["essay", "lang", "depth", "clarity", "final"]);
        graph.set_entry_point("essay");
        graph.add_edge("essay", "lang");
        graph.add_edge("essay", "depth");
        graph.add_edge("essay", "clarity");
        graph.add_edge("lang", "final");
        graph.add_edge("depth", "final");
        graph.add_edge("clarity", "final");
        graph.add_edge("final", END);
        let app = graph.compile().unwrap();
        assert_eq!(app.node_count(), 5);
        assert_eq!(app.edge_count(), 7);
    }

    #[test]
    fn builder_accessors() {
        let mut graph = graph_with(&["a"]);
        assert_eq!(graph.get_entry_point(), None);
        graph.set_entry_point("a");
        assert_eq!(graph.get_entry_point(), Some("a"));
        assert_eq!(graph.node_names().count(), 1);
    }
}
