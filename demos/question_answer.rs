//! Minimal sequential chain: collect a question, answer it.
//!
//! Two nodes in a row over a two-field state, wired through the
//! interactive-input and text-generation collaborator traits. With no real
//! terminal or model attached, both collaborators are canned stubs.
//!
//! Run with:
//! ```bash
//! cargo run --example question_answer
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use flowgraph::{
    InteractiveInputService, Result, ResultShape, StateGraph, StateRecord, StateSchema,
    StateUpdate, TextGenerationService, END,
};
use serde_json::Value;

struct CannedConsole;

#[async_trait]
impl InteractiveInputService for CannedConsole {
    async fn read_line(&self, prompt: &str) -> Result<String> {
        println!("{prompt}What makes Rust fast?");
        Ok("What makes Rust fast?".to_string())
    }
}

struct CannedModel;

#[async_trait]
impl TextGenerationService for CannedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("[answer to: {prompt}]"))
    }

    async fn generate_structured(&self, prompt: &str, _shape: &ResultShape) -> Result<Value> {
        Ok(Value::String(format!("[structured answer to: {prompt}]")))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut graph = StateGraph::new(StateSchema::new());
    let console = Arc::new(CannedConsole);
    let model = Arc::new(CannedModel);

    graph.add_node_from_fn("question", move |_state| {
        let console = Arc::clone(&console);
        Box::pin(async move {
            let question = console.read_line("Ask your Question: ").await?;
            Ok(StateUpdate::new().set("question", question))
        })
    })?;

    graph.add_node_from_fn("answer", move |state| {
        let model = Arc::clone(&model);
        Box::pin(async move {
            let question = state.get_str("question").unwrap_or_default().to_string();
            let answer = model.generate(&question).await?;
            Ok(StateUpdate::new().set("answer", answer))
        })
    })?;

    graph.set_entry_point("question");
    graph.add_edge("question", "answer");
    graph.add_edge("answer", END);

    let app = graph.compile()?.with_name("question_answer");
    let result = app.invoke(StateRecord::new()).await?;

    println!("{}", serde_json::to_string_pretty(result.state())?);

    Ok(())
}
