// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! State schema, records, and partial updates.
//!
//! A graph run owns exactly one [`StateRecord`]. Node bodies receive owned
//! snapshots of it and communicate results only through the [`StateUpdate`]
//! they return; the executor folds those updates back into the record
//! between frontiers. Field values are `serde_json::Value` so heterogeneous
//! workflows share one record shape, and the [`StateSchema`] pins how
//! concurrent writes to a field combine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// How partial updates to one field are combined into the running state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Replace the existing value. Among parallel siblings the
    /// last-registered branch wins, independent of completion order.
    #[default]
    Overwrite,
    /// Concatenate onto the existing sequence, in branch-registration
    /// order. The existing value (when present) and the update value must
    /// both be sequences; an absent field counts as the empty sequence.
    Append,
}

/// Per-field merge policies, declared once before the graph is built.
///
/// Undeclared fields default to [`MergePolicy::Overwrite`].
///
/// # Example
///
/// ```rust
/// use flowgraph::{MergePolicy, StateSchema};
///
/// let schema = StateSchema::new()
///     .field("individual_scores", MergePolicy::Append)
///     .field("essay", MergePolicy::Overwrite);
/// assert_eq!(schema.policy("individual_scores"), MergePolicy::Append);
/// assert_eq!(schema.policy("never_declared"), MergePolicy::Overwrite);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateSchema {
    policies: HashMap<String, MergePolicy>,
}

impl StateSchema {
    /// Create an empty schema (every field defaults to OVERWRITE).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field's merge policy.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, policy: MergePolicy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }

    /// Policy for `name`; [`MergePolicy::Overwrite`] when undeclared.
    #[must_use]
    pub fn policy(&self, name: &str) -> MergePolicy {
        self.policies.get(name).copied().unwrap_or_default()
    }
}

/// The running state of one graph execution.
///
/// Fields are optional until first written. The record is owned exclusively
/// by the executor for the duration of a run and is mutated only through
/// frontier merges; node bodies see immutable snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateRecord {
    fields: HashMap<String, Value>,
}

impl StateRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a field, chainable. Intended for building the initial state.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Raw value of `name`, if the field has been written.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of `name`, if present and a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Signed integer value of `name`, if present and representable.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    /// Unsigned integer value of `name`, if present and representable.
    #[must_use]
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }

    /// Float value of `name`, if present and numeric.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// Boolean value of `name`, if present and a boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    /// Sequence value of `name`, if present and a sequence.
    #[must_use]
    pub fn get_array(&self, name: &str) -> Option<&Vec<Value>> {
        self.fields.get(name).and_then(Value::as_array)
    }

    /// True if the field has been written.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no field has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.fields.insert(name, value);
    }

    pub(crate) fn fields_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.fields
    }
}

impl TryFrom<Value> for StateRecord {
    type Error = Error;

    /// Build an initial record from a JSON object literal.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(serde_json::from_value(value)?)
    }
}

/// The subset of state fields one node invocation returns.
///
/// An empty update is legal: the node touched nothing and every field
/// retains its prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateUpdate {
    fields: HashMap<String, Value>,
}

impl StateUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a field, chainable.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// True if the update touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}
