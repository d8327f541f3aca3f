// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lenient normalization of embedder-supplied data.
//!
//! Engines never fail on bad data. Malformed entries are dropped (or, where
//! indices must stay stable, replaced by an inert placeholder) and reported
//! with `tracing::warn!`; wholly unusable input becomes an empty dataset and
//! the chart renders nothing.

use genoviz_core::hierarchy::TreeRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Interprets `value` as one or many numeric series.
///
/// A flat array is one series; an array of arrays is many. Non-numeric
/// entries are skipped.
#[must_use]
pub fn series_from_json(value: &Value) -> Vec<Vec<f64>> {
    let Value::Array(items) = value else {
        tracing::warn!(kind = json_kind(value), "series data is not an array");
        return Vec::new();
    };
    let nested = items.first().is_some_and(Value::is_array);
    let series: Vec<Vec<f64>> = if nested {
        items
            .iter()
            .map(|s| s.as_array().map(|a| numbers(a)).unwrap_or_default())
            .collect()
    } else {
        vec![numbers(items)]
    };
    normalize_series(series)
}

fn numbers(items: &[Value]) -> Vec<f64> {
    items.iter().filter_map(Value::as_f64).collect()
}

/// Drops non-finite values from every series.
#[must_use]
pub fn normalize_series(mut series: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let mut dropped = 0;
    for s in &mut series {
        let before = s.len();
        s.retain(|v| v.is_finite());
        dropped += before - s.len();
    }
    if dropped > 0 {
        tracing::warn!(dropped, "non-finite series values dropped");
    }
    series
}

/// Interprets `value` as `[start, end]` pairs.
///
/// Malformed entries become `(NaN, NaN)` so that later entries keep their
/// index; they are never drawn or hit.
#[must_use]
pub fn ranges_from_json(value: &Value) -> Vec<(f64, f64)> {
    let Value::Array(items) = value else {
        tracing::warn!(kind = json_kind(value), "range data is not an array");
        return Vec::new();
    };
    let mut malformed = 0_usize;
    let ranges: Vec<(f64, f64)> = items
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([a, b, ..]) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    malformed += 1;
                    (f64::NAN, f64::NAN)
                }
            },
            _ => {
                malformed += 1;
                (f64::NAN, f64::NAN)
            }
        })
        .collect();
    if malformed > 0 {
        tracing::warn!(malformed, "malformed ranges will not be drawn");
    }
    ranges
}

/// Interprets `value` as flat tree records. Unparseable input yields no
/// records.
#[must_use]
pub fn tree_records_from_json(value: &Value) -> Vec<TreeRecord> {
    match Vec::<TreeRecord>::deserialize(value) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(%err, "tree records did not parse");
            Vec::new()
        }
    }
}

/// A row or column header.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisLabel {
    /// Display text.
    pub label: String,
}

impl From<&str> for AxisLabel {
    fn from(label: &str) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Heatmap input: labels plus a row-major value matrix with gaps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapData {
    /// One label per row.
    pub row_labels: Vec<AxisLabel>,
    /// One label per column.
    pub column_labels: Vec<AxisLabel>,
    /// `values[row][column]`; `None` means no value.
    pub values: Vec<Vec<Option<f64>>>,
}

impl HeatmapData {
    /// Parses heatmap data, falling back to an empty matrix.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match Self::deserialize(value) {
            Ok(data) => data.normalized(),
            Err(err) => {
                tracing::warn!(%err, "heatmap data did not parse");
                Self::default()
            }
        }
    }

    /// Pads or truncates the matrix to the label counts and turns non-finite
    /// values into gaps.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let (rows, cols) = (self.row_labels.len(), self.column_labels.len());
        if self.values.len() != rows || self.values.iter().any(|r| r.len() != cols) {
            tracing::warn!(rows, cols, "heatmap matrix does not match its labels");
        }
        self.values.resize(rows, Vec::new());
        for row in &mut self.values {
            row.resize(cols, None);
            for v in row.iter_mut() {
                if v.is_some_and(|v| !v.is_finite()) {
                    *v = None;
                }
            }
        }
        self
    }

    /// Returns `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.column_labels.len())
    }

    /// Returns the value at `(row, column)`.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.values.get(row)?.get(column).copied().flatten()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
