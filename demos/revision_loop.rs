//! Iterative revision loop with a conditional exit.
//!
//! A generator drafts a tweet, a critic evaluates it, and a router either
//! approves (straight to END) or loops back through an optimizer. The loop
//! carries its own iteration counter; the router compares it against
//! `max_iteration` to force an exit, and the engine's step ceiling backstops
//! everything else.
//!
//! Run with:
//! ```bash
//! cargo run --example revision_loop
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowgraph::{
    MergePolicy, Result, ResultShape, StateGraph, StateRecord, StateSchema, StateUpdate,
    TextGenerationService, END,
};
use serde_json::{json, Value};

/// A critic that is never satisfied. The loop exits only through the
/// iteration bound, which is exactly what this demo wants to show.
struct RuthlessCritic;

#[async_trait]
impl TextGenerationService for RuthlessCritic {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let first_line = prompt.lines().next().unwrap_or(prompt);
        Ok(format!("[tweet drafted for: {first_line}]"))
    }

    async fn generate_structured(&self, _prompt: &str, _shape: &ResultShape) -> Result<Value> {
        Ok(json!({
            "evaluation": "needs_improvement",
            "feedback": "Not funny enough. Punch it up.",
        }))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let schema = StateSchema::new()
        .field("tweet_history", MergePolicy::Append)
        .field("feedback_history", MergePolicy::Append);
    let mut graph = StateGraph::new(schema);
    let model = Arc::new(RuthlessCritic);

    let generator = Arc::clone(&model);
    graph.add_node_from_fn("generate_tweet", move |state| {
        let model = Arc::clone(&generator);
        Box::pin(async move {
            let topic = state.get_str("topic").unwrap_or_default().to_string();
            let tweet = model
                .generate(&format!("Write a short, original tweet on: {topic}"))
                .await?;
            Ok(StateUpdate::new()
                .set("tweet", tweet.clone())
                .set("tweet_history", json!([tweet])))
        })
    })?;

    let critic = Arc::clone(&model);
    graph.add_node_from_fn("evaluate_tweet", move |state| {
        let model = Arc::clone(&critic);
        Box::pin(async move {
            let tweet = state.get_str("tweet").unwrap_or_default().to_string();
            let shape = ResultShape::new(json!({
                "evaluation": ["approved", "needs_improvement"],
                "feedback": "string",
            }));
            let out = model
                .generate_structured(&format!("Evaluate the following tweet:\n{tweet}"), &shape)
                .await?;
            Ok(StateUpdate::new()
                .set("evaluation", out["evaluation"].clone())
                .set("feedback", out["feedback"].clone())
                .set("feedback_history", json!([out["feedback"]])))
        })
    })?;

    let optimizer = Arc::clone(&model);
    graph.add_node_from_fn("optimize_tweet", move |state| {
        let model = Arc::clone(&optimizer);
        Box::pin(async move {
            let feedback = state.get_str("feedback").unwrap_or_default().to_string();
            let tweet = state.get_str("tweet").unwrap_or_default().to_string();
            let iteration = state.get_i64("iteration").unwrap_or(0) + 1;
            let improved = model
                .generate(&format!(
                    "Improve the tweet based on this feedback: {feedback}\nOriginal: {tweet}"
                ))
                .await?;
            Ok(StateUpdate::new()
                .set("tweet", improved.clone())
                .set("iteration", iteration)
                .set("tweet_history", json!([improved])))
        })
    })?;

    graph.set_entry_point("generate_tweet");
    graph.add_edge("generate_tweet", "evaluate_tweet");
    graph.add_conditional_edges(
        "evaluate_tweet",
        |state: &StateRecord| {
            let approved = state.get_str("evaluation") == Some("approved");
            let iteration = state.get_i64("iteration").unwrap_or(0);
            let max_iteration = state.get_i64("max_iteration").unwrap_or(0);
            if approved || iteration >= max_iteration {
                "approved".to_string()
            } else {
                "needs_improvement".to_string()
            }
        },
        HashMap::from([
            ("approved".to_string(), END.to_string()),
            ("needs_improvement".to_string(), "optimize_tweet".to_string()),
        ]),
    );
    graph.add_edge("optimize_tweet", "evaluate_tweet");

    let app = graph.compile()?.with_name("revision_loop");

    let initial = StateRecord::new()
        .with("topic", "The future of AI")
        .with("iteration", 1)
        .with("max_iteration", 3);
    let result = app.invoke(initial).await?;

    println!("Execution path: {:?}", result.execution_path());
    println!("Frontier advances: {}", result.steps);
    println!("Final tweet: {}", result.state().get_str("tweet").unwrap_or_default());
    println!(
        "Revisions kept: {}",
        result.state().get_array("tweet_history").map_or(0, Vec::len)
    );

    Ok(())
}
