//! Shared test utilities for the evidra workspace.
//!
//! `xtask` needs `normalize_nondeterministic` at runtime, and three crates need the local sink,
//! so neither can live behind `#[cfg(test)]`.

pub mod sink;

use serde_json::Value;

pub const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// `collected` is stamped with the wall clock at mapping time, so it is replaced at any depth.
/// Report-derived times (`evaluated_on`, `time`) are deterministic and left alone.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    normalize_recursive(&mut value);
    value
}

fn normalize_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(collected) = map.get_mut("collected")
                && collected.is_string()
            {
                *collected = Value::String(TIMESTAMP_PLACEHOLDER.to_string());
            }
            for val in map.values_mut() {
                normalize_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_recursive(val);
            }
        }
        _ => {}
    }
}
