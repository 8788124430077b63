// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Edge kinds and the virtual graph markers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::state::StateRecord;

/// Virtual terminal marker. Static edge targets and conditional route
/// targets may alias it directly; execution ends when every live path has
/// reached it.
pub const END: &str = "__end__";

/// Virtual start marker. Only used in diagnostics; the entry node is
/// declared with [`StateGraph::set_entry_point`](crate::StateGraph::set_entry_point).
pub const START: &str = "__start__";

/// An unconditional edge.
///
/// Several edges leaving one node fan the successors out into a parallel
/// frontier; their declaration order is the branch-registration order the
/// merge contracts are stated in. A back-edge (target already visited) is
/// just an `Edge`. Cycles need no special construct.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Router function: maps the just-merged state to a route label.
pub type Router = dyn Fn(&StateRecord) -> String + Send + Sync;

/// A conditional edge: at run time the router's label selects the target
/// out of a closed, statically declared route map.
///
/// Routers are opaque and never invoked at compile time, so an
/// unmapped label is a run-time routing error, not a compile-time fault.
#[derive(Clone)]
pub struct ConditionalEdge {
    pub from: String,
    pub(crate) router: Arc<Router>,
    pub routes: HashMap<String, String>,
}

impl ConditionalEdge {
    pub(crate) fn evaluate(&self, state: &StateRecord) -> String {
        (self.router)(state)
    }
}

impl fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_edge_evaluates_router_against_state() {
        let edge = ConditionalEdge {
            from: "evaluate".to_string(),
            router: Arc::new(|state: &StateRecord| {
                if state.get_bool("approved").unwrap_or(false) {
                    "approved".to_string()
                } else {
                    "needs_improvement".to_string()
                }
            }),
            routes: HashMap::from([
                ("approved".to_string(), END.to_string()),
                ("needs_improvement".to_string(), "optimize".to_string()),
            ]),
        };

        let label = edge.evaluate(&StateRecord::new().with("approved", true));
        assert_eq!(edge.routes.get(&label).map(String::as_str), Some(END));

        let label = edge.evaluate(&StateRecord::new());
        assert_eq!(edge.routes.get(&label).map(String::as_str), Some("optimize"));
    }

    #[test]
    fn debug_omits_the_router() {
        let edge = ConditionalEdge {
            from: "a".to_string(),
            router: Arc::new(|_| "x".to_string()),
            routes: HashMap::new(),
        };
        let rendered = format!("{edge:?}");
        assert!(rendered.contains("from"));
        assert!(!rendered.contains("router"));
    }
}
