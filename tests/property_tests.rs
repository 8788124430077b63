//! Property-based tests for graph compilation and execution.
//!
//! # Tested Invariants
//!
//! 1. **Structural validation**: a random graph compiles iff every node is
//!    reachable from entry AND every node has a path to END, checked
//!    against an independent BFS oracle.
//! 2. **Chain execution**: a compiled sequential chain of any length runs
//!    every node exactly once, in order, taking one frontier advance per
//!    node.
//!
//! Run with more iterations to find rarer edge cases:
//! ```bash
//! PROPTEST_CASES=10000 cargo test --test property_tests --release
//! ```

use std::collections::{HashSet, VecDeque};

use flowgraph::{Error, MergePolicy, StateGraph, StateRecord, StateSchema, StateUpdate, END};
use proptest::prelude::*;
use serde_json::json;

/// A randomly shaped graph: `node_count` nodes named `n0..`, plus directed
/// edges where a target index of `node_count` stands for END.
#[derive(Debug, Clone)]
struct RandomGraph {
    node_count: usize,
    edges: Vec<(usize, usize)>,
}

fn arb_random_graph() -> impl Strategy<Value = RandomGraph> {
    (1usize..=6).prop_flat_map(|node_count| {
        proptest::collection::vec((0..node_count, 0..=node_count), 0..=12).prop_map(
            move |edges| RandomGraph { node_count, edges },
        )
    })
}

impl RandomGraph {
    fn build(&self) -> StateGraph {
        let mut graph = StateGraph::new(StateSchema::new());
        for i in 0..self.node_count {
            graph
                .add_node_from_fn(format!("n{i}"), |_state| {
                    Box::pin(async move { Ok(StateUpdate::new()) })
                })
                .unwrap();
        }
        graph.set_entry_point("n0");
        for &(from, to) in &self.edges {
            let to_name = if to == self.node_count {
                END.to_string()
            } else {
                format!("n{to}")
            };
            graph.add_edge(format!("n{from}"), to_name);
        }
        graph
    }

    /// Independent oracle: forward BFS from node 0.
    fn all_reachable(&self) -> bool {
        let mut visited = HashSet::from([0]);
        let mut queue = VecDeque::from([0]);
        while let Some(current) = queue.pop_front() {
            for &(from, to) in &self.edges {
                if from == current && to != self.node_count && visited.insert(to) {
                    queue.push_back(to);
                }
            }
        }
        visited.len() == self.node_count
    }

    /// Independent oracle: reverse BFS from the virtual END index.
    fn all_reach_end(&self) -> bool {
        let end = self.node_count;
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue = VecDeque::from([end]);
        while let Some(current) = queue.pop_front() {
            for &(from, to) in &self.edges {
                if to == current && visited.insert(from) {
                    queue.push_back(from);
                }
            }
        }
        visited.len() == self.node_count
    }
}

proptest! {
    /// Compilation succeeds exactly when the two structural invariants hold,
    /// and the failure kind matches the first violated invariant.
    #[test]
    fn compile_succeeds_iff_reachable_and_terminating(random in arb_random_graph()) {
        let reachable = random.all_reachable();
        let terminating = random.all_reach_end();

        match random.build().compile() {
            Ok(app) => {
                prop_assert!(reachable, "compiled but oracle found an unreachable node");
                prop_assert!(terminating, "compiled but oracle found a node with no path to END");
                prop_assert_eq!(app.entry_point(), "n0");
                prop_assert_eq!(app.node_count(), random.node_count);
            }
            Err(Error::UnreachableNode(_)) => prop_assert!(!reachable),
            Err(Error::MissingTerminal(_)) => {
                prop_assert!(reachable, "reachability is checked before terminal paths");
                prop_assert!(!terminating);
            }
            Err(other) => prop_assert!(false, "unexpected compile error: {other}"),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A sequential chain of length `len` executes every node once, in
    /// order, with one frontier advance per node.
    #[test]
    fn chains_execute_in_order(len in 1usize..=8) {
        let schema = StateSchema::new().field("trail", MergePolicy::Append);
        let mut graph = StateGraph::new(schema);
        for i in 0..len {
            graph
                .add_node_from_fn(format!("n{i}"), move |_state| {
                    Box::pin(async move {
                        Ok(StateUpdate::new().set("trail", json!([i])))
                    })
                })
                .unwrap();
        }
        graph.set_entry_point("n0");
        for i in 1..len {
            graph.add_edge(format!("n{}", i - 1), format!("n{i}"));
        }
        graph.add_edge(format!("n{}", len - 1), END);

        let app = graph.compile().unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let result = runtime.block_on(app.invoke(StateRecord::new())).unwrap();

        prop_assert_eq!(result.steps as usize, len);
        let expected: Vec<_> = (0..len).map(|i| json!(i)).collect();
        prop_assert_eq!(result.state().get_array("trail"), Some(&expected));
    }
}
