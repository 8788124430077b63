// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Collaborator capabilities consumed from inside node bodies.
//!
//! The engine never implements these. Workflows inject an implementation
//! (usually as an `Arc` cloned into node closures) and call it from their
//! node bodies; to the engine the calls are opaque, potentially slow, and
//! potentially failing. Per-call timeout or retry policy belongs to the
//! implementation or a wrapper around it, never to the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Opaque shape contract for structured generation.
///
/// Carries whatever schema blob the provider understands. The engine never
/// validates payload content against it; honoring the shape is the
/// provider's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultShape(pub Value);

impl ResultShape {
    /// Wrap a schema blob.
    #[must_use]
    pub fn new(shape: Value) -> Self {
        Self(shape)
    }
}

/// Generative-text capability.
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Free-form generation.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generation constrained to `shape`. The returned value is expected
    /// to conform to the shape; the engine treats it as opaque.
    async fn generate_structured(&self, prompt: &str, shape: &ResultShape) -> Result<Value>;
}

/// Operator-input capability, for node bodies that need a human in the loop.
#[async_trait]
pub trait InteractiveInputService: Send + Sync {
    /// Prompt the operator and return one line of input.
    async fn read_line(&self, prompt: &str) -> Result<String>;
}
