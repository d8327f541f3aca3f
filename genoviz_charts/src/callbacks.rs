// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Embedder callbacks.
//!
//! Each engine takes a struct of optional boxed closures. Unset callbacks are
//! no-ops. Callbacks run synchronously inside `handle_pointer`; a panic in
//! one propagates to the caller.

use core::fmt;

use genoviz_core::hierarchy::{NodeId, Tree};
use kurbo::Point;

use crate::heatmap::HeatmapCell;
use crate::histogram::Bin;

macro_rules! callbacks {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident($($arg:ty),*)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: Option<Box<dyn FnMut($($arg),*)>>,
            )*
        }

        impl $name {
            $(
                #[doc = concat!("Sets `", stringify!($field), "`.")]
                #[must_use]
                pub fn $field(mut self, f: impl FnMut($($arg),*) + 'static) -> Self {
                    self.$field = Some(Box::new(f));
                    self
                }
            )*
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &self.$field.is_some()))*
                    .finish()
            }
        }
    };
}

callbacks! {
    /// Histogram callbacks.
    HistogramCallbacks {
        /// The pointer entered a bar: `(series, bin)`.
        on_bar_enter(usize, &Bin),
        /// The pointer left the hovered bar.
        on_bar_exit(),
        /// The pointer moved over a bar, in client coordinates.
        on_bar_hover(Point),
        /// A bar was clicked: `(series, bin)`.
        on_bar_click(usize, &Bin),
        /// A click landed outside every bar.
        on_empty_click(),
    }
}

callbacks! {
    /// Genome track callbacks.
    GenomeCallbacks {
        /// The pointer entered the bar at this data index.
        on_bar_enter(usize),
        /// The pointer left the hovered bar.
        on_bar_exit(),
        /// The pointer moved over a bar, in client coordinates.
        on_bar_hover(Point),
        /// A click outlined a bar, or cleared the outline with `None`.
        on_bar_click(Option<usize>),
    }
}

callbacks! {
    /// Tidy tree callbacks.
    TreeCallbacks {
        /// The pointer entered a node.
        on_node_enter(&Tree, NodeId),
        /// The pointer moved over a node, in client coordinates.
        on_node_hover(&Tree, NodeId, Point),
        /// The pointer left the hovered node.
        on_node_leave(),
        /// A click toggled the collapse state of a node.
        on_collapsed_state_change(&Tree, NodeId),
        /// A new tree was installed and laid out.
        on_created_tree(&Tree),
    }
}

callbacks! {
    /// Heatmap callbacks.
    HeatmapCallbacks {
        /// The pointer moved over a cell.
        on_node_hover(&HeatmapCell),
        /// The pointer left the grid.
        on_node_hover_out(),
        /// A cell was clicked.
        on_cell_click(&HeatmapCell),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn builders_install_closures() {
        let clicks = Rc::new(Cell::new(0));
        let seen = Rc::clone(&clicks);
        let mut callbacks = GenomeCallbacks::default().on_bar_click(move |hit| {
            if hit.is_some() {
                seen.set(seen.get() + 1);
            }
        });
        if let Some(f) = &mut callbacks.on_bar_click {
            f(Some(3));
            f(None);
        }
        assert_eq!(clicks.get(), 1);
        assert!(callbacks.on_bar_enter.is_none());
    }

    #[test]
    fn debug_reports_installed_callbacks() {
        let callbacks = HeatmapCallbacks::default().on_node_hover_out(|| {});
        let debug = format!("{callbacks:?}");
        assert!(debug.contains("on_node_hover_out: true"), "{debug}");
        assert!(debug.contains("on_cell_click: false"), "{debug}");
    }
}
