// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use genoviz_core::hierarchy::{CollapseError, StratifyError};
use genoviz_render::ExportError;

/// Errors surfaced by chart engines.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// An options value or patch did not deserialize.
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
    /// Tree records could not be assembled into a hierarchy.
    #[error("invalid tree: {0}")]
    Stratify(#[from] StratifyError),
    /// The collapse configuration is unusable.
    #[error("cannot collapse tree: {0}")]
    Collapse(#[from] CollapseError),
    /// Raster export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}
