// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Field-level merge of partial updates into the running state.
//!
//! One frontier produces one update per sibling; [`apply_updates`] folds
//! them into a copy of the running state in branch-registration order and
//! hands the copy back only when every update applied cleanly, so a failed
//! merge never leaves the caller's record half-written.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::state::{MergePolicy, StateRecord, StateSchema, StateUpdate};

/// Fold `updates` into a copy of `base`, in slice order.
///
/// Slice order is branch-registration order, which makes the stated merge
/// contracts fall out directly: OVERWRITE fields written by several
/// siblings end up with the last-registered value, and APPEND fields
/// concatenate in registration order regardless of completion order.
///
/// # Errors
///
/// [`Error::MergeType`] when an APPEND policy meets a non-sequence value on
/// either side. The returned error leaves `base` untouched.
pub fn apply_updates(
    schema: &StateSchema,
    base: &StateRecord,
    updates: &[StateUpdate],
) -> Result<StateRecord> {
    let mut merged = base.clone();
    for update in updates {
        for (field, value) in update.iter() {
            match schema.policy(field) {
                MergePolicy::Overwrite => merged.insert(field.clone(), value.clone()),
                MergePolicy::Append => append_field(&mut merged, field, value)?,
            }
        }
    }
    Ok(merged)
}

/// Concatenate `value` onto the sequence stored under `field`, treating an
/// absent field as the empty sequence.
fn append_field(record: &mut StateRecord, field: &str, value: &Value) -> Result<()> {
    let additions = match value {
        Value::Array(items) => items.clone(),
        other => {
            return Err(Error::MergeType {
                field: field.to_string(),
                found: kind_of(other),
            })
        }
    };
    let slot = record
        .fields_mut()
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match slot {
        Value::Array(existing) => existing.extend(additions),
        other => {
            return Err(Error::MergeType {
                field: field.to_string(),
                found: kind_of(other),
            })
        }
    }
    Ok(())
}

/// Value class name used in [`Error::MergeType`] messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "an object",
    }
}
