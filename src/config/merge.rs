//! Option merging
//!
//! Deep merge of JSON-shaped option maps where sequences accumulate instead of
//! being replaced: `{"external": ["base"]}` merged with `{"external": ["a"]}`
//! yields `["base", "a"]`.

use serde_json::Value;

/// Merge `overrides` into `base` and return the result.
///
/// - both mappings: merged key by key, recursively
/// - `base` is a sequence: a sequence override is spliced onto the end, any
///   other override is appended as one trailing element
/// - anything else: the override wins
///
/// `base` is consumed and used as the accumulator.
pub fn merge_config(mut base: Value, overrides: Value) -> Value {
    merge_into(&mut base, overrides);
    base
}

/// Fold several override layers over `base`, left to right.
pub fn merge_all<I>(base: Value, layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers.into_iter().fold(base, merge_config)
}

fn merge_into(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Array(items), Value::Array(more)) => items.extend(more),
        (Value::Array(items), other) => items.push(other),
        (Value::Object(t_map), Value::Object(s_map)) => {
            for (key, value) in s_map {
                match t_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        t_map.insert(key, value);
                    }
                }
            }
        }
        (t, s) => *t = s,
    }
}
