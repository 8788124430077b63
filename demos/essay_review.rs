//! Parallel fan-out essay review workflow.
//!
//! One node drafts an essay, three evaluator nodes score it concurrently
//! against the same state snapshot, each appending into a shared APPEND
//! field, and a final node folds the feedback together once the frontier
//! joins. The scores land in branch-registration order no matter which
//! evaluator finishes first.
//!
//! Run with:
//! ```bash
//! cargo run --example essay_review
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use flowgraph::{
    MergePolicy, Result, ResultShape, StateGraph, StateRecord, StateSchema, StateUpdate,
    TextGenerationService, END,
};
use futures::future::BoxFuture;
use serde_json::{json, Value};

/// Offline stand-in for a real generation backend. Deterministic so the
/// demo runs without credentials.
struct CannedModel;

#[async_trait]
impl TextGenerationService for CannedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let first_line = prompt.lines().next().unwrap_or(prompt);
        Ok(format!("[generated text for: {first_line}]"))
    }

    async fn generate_structured(&self, prompt: &str, _shape: &ResultShape) -> Result<Value> {
        // vary the score per prompt so the branches are distinguishable
        let score = 6 + (prompt.len() % 4) as u64;
        Ok(json!({
            "feedback": format!("[structured feedback, {} prompt chars]", prompt.len()),
            "score": score,
        }))
    }
}

/// Build an evaluator node scoring one aspect of the essay.
fn evaluator(
    model: Arc<CannedModel>,
    aspect: &'static str,
    field: &'static str,
) -> impl Fn(StateRecord) -> BoxFuture<'static, Result<StateUpdate>> {
    move |state| {
        let model = Arc::clone(&model);
        Box::pin(async move {
            let essay = state.get_str("essay").unwrap_or_default().to_string();
            let shape = ResultShape::new(json!({"feedback": "string", "score": "integer"}));
            let prompt = format!(
                "Evaluate the {aspect} of the following essay and provide a feedback \
                 and assign a score out of 10\n{essay}"
            );
            let out = model.generate_structured(&prompt, &shape).await?;
            Ok(StateUpdate::new()
                .set(field, out["feedback"].clone())
                .set("individual_scores", json!([out["score"]])))
        })
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let schema = StateSchema::new().field("individual_scores", MergePolicy::Append);
    let mut graph = StateGraph::new(schema);
    let model = Arc::new(CannedModel);

    let drafting_model = Arc::clone(&model);
    graph.add_node_from_fn("generate_essay", move |state| {
        let model = Arc::clone(&drafting_model);
        Box::pin(async move {
            let topic = state.get_str("topic").unwrap_or_default().to_string();
            let essay = model.generate(&format!("Generate an essay on {topic}")).await?;
            Ok(StateUpdate::new().set("essay", essay))
        })
    })?;

    graph.add_node_from_fn(
        "language_feedback",
        evaluator(Arc::clone(&model), "language quality", "language_feedback"),
    )?;
    graph.add_node_from_fn(
        "analysis_feedback",
        evaluator(Arc::clone(&model), "depth of analysis", "analysis_feedback"),
    )?;
    graph.add_node_from_fn(
        "clarity_feedback",
        evaluator(Arc::clone(&model), "clarity of thought", "clarity_feedback"),
    )?;

    let summary_model = Arc::clone(&model);
    graph.add_node_from_fn("final_evaluation", move |state| {
        let model = Arc::clone(&summary_model);
        Box::pin(async move {
            let scores = state.get_array("individual_scores").cloned().unwrap_or_default();
            let total: f64 = scores.iter().filter_map(Value::as_f64).sum();
            let avg_score = if scores.is_empty() {
                0.0
            } else {
                total / scores.len() as f64
            };
            let prompt = format!(
                "Based on the following feedbacks create a summarized feedback\n\
                 language feedback - {}\n\
                 depth of analysis feedback - {}\n\
                 clarity of thought feedback - {}",
                state.get_str("language_feedback").unwrap_or_default(),
                state.get_str("analysis_feedback").unwrap_or_default(),
                state.get_str("clarity_feedback").unwrap_or_default(),
            );
            let overall = model.generate(&prompt).await?;
            Ok(StateUpdate::new()
                .set("overall_feedback", overall)
                .set("avg_score", avg_score))
        })
    })?;

    graph.set_entry_point("generate_essay");
    graph.add_edge("generate_essay", "language_feedback");
    graph.add_edge("generate_essay", "analysis_feedback");
    graph.add_edge("generate_essay", "clarity_feedback");
    graph.add_edge("language_feedback", "final_evaluation");
    graph.add_edge("analysis_feedback", "final_evaluation");
    graph.add_edge("clarity_feedback", "final_evaluation");
    graph.add_edge("final_evaluation", END);

    let app = graph.compile()?.with_name("essay_review");

    let initial = StateRecord::new().with("topic", "The role of technology in modern education");
    let result = app.invoke(initial).await?;

    println!("Execution path: {:?}", result.execution_path());
    println!("Frontier advances: {}", result.steps);
    println!("{}", serde_json::to_string_pretty(result.state())?);

    Ok(())
}
