// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared option types and JSON merge patching.
//!
//! Every engine keeps its options as a serde struct with
//! `#[serde(rename_all = "camelCase", default)]`, so embedders can pass only
//! the keys they care about. [`merge_patch`] applies a JSON merge patch
//! (RFC 7386) over the current options and reports the top-level keys whose
//! value actually changed, which engines use to decide how much work an
//! update needs.

use kurbo::Vec2;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ChartError;

/// Space reserved around the plot area, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    /// Top margin.
    pub top: f64,
    /// Right margin.
    pub right: f64,
    /// Bottom margin.
    pub bottom: f64,
    /// Left margin.
    pub left: f64,
}

impl Margins {
    /// Creates margins in CSS order.
    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Returns the offset of the plot origin.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Returns `left + right`.
    #[must_use]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Returns `top + bottom`.
    #[must_use]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// The outcome of a successful [`merge_patch`].
#[derive(Clone, Debug, PartialEq)]
pub struct Patched<T> {
    /// The merged options.
    pub options: T,
    /// Top-level keys whose value changed, in patch order.
    pub changed: Vec<String>,
}

impl<T> Patched<T> {
    /// Returns whether any of `keys` changed.
    #[must_use]
    pub fn touched(&self, keys: &[&str]) -> bool {
        self.changed.iter().any(|k| keys.contains(&k.as_str()))
    }
}

/// Merges `patch` over the serialized form of `current`.
///
/// `null` resets a key to its default. The patch must be a JSON object; on
/// any error `current` is left for the caller to keep.
pub fn merge_patch<T>(current: &T, patch: &Value) -> Result<Patched<T>, ChartError>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(patch) = patch else {
        return Err(serde_json::Error::custom("options patch must be a JSON object").into());
    };
    let mut base = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut changed = Vec::new();
    for (key, value) in patch {
        let before = base.get(key).cloned();
        merge_value(&mut base, key, value);
        if base.get(key) != before.as_ref() {
            changed.push(key.clone());
        }
    }
    let options = serde_json::from_value(Value::Object(base))?;
    Ok(Patched { options, changed })
}

fn merge_value(target: &mut Map<String, Value>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            target.remove(key);
        }
        Value::Object(patch) => {
            let entry = target
                .entry(key.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                for (k, v) in patch {
                    merge_value(inner, k, v);
                }
            }
        }
        _ => {
            target.insert(key.to_owned(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct Sample {
        hover_buffer: f64,
        margins: Margins,
        label: Option<String>,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                hover_buffer: 5.0,
                margins: Margins::new(20.0, 40.0, 40.0, 40.0),
                label: None,
            }
        }
    }

    #[test]
    fn reports_only_changed_keys() {
        let current = Sample::default();
        let patched = merge_patch(
            &current,
            &json!({ "hoverBuffer": 5.0, "margins": { "left": 10.0 }, "label": "x" }),
        )
        .unwrap();
        assert_eq!(patched.changed, ["margins", "label"]);
        assert_eq!(patched.options.margins, Margins::new(20.0, 40.0, 40.0, 10.0));
        assert!(patched.touched(&["label"]));
        assert!(!patched.touched(&["hoverBuffer"]));
    }

    #[test]
    fn null_restores_default() {
        let current = Sample {
            hover_buffer: 0.0,
            ..Sample::default()
        };
        let patched = merge_patch(&current, &json!({ "hoverBuffer": null })).unwrap();
        assert_eq!(patched.options.hover_buffer, 5.0);
        assert_eq!(patched.changed, ["hoverBuffer"]);
    }

    #[test]
    fn rejects_bad_patches() {
        let current = Sample::default();
        assert!(matches!(
            merge_patch(&current, &json!([1, 2])),
            Err(ChartError::Options(_))
        ));
        assert!(
            merge_patch(&current, &json!({ "hoverBuffer": "wide" })).is_err(),
            "type mismatch must not deserialize"
        );
    }
}
