// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::id::{ElementId, INVALID};
use super::store::SceneStore;

/// An iterator over the direct children of an element.
///
/// Created by [`SceneStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a SceneStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a SceneStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(ElementId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}
