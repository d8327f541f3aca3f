// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect, Size};

use super::HitTester;

/// A cell in a [`GridIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCell {
    /// Row, counted from the top.
    pub row: usize,
    /// Column, counted from the left.
    pub col: usize,
}

/// A uniform `rows × cols` grid anchored at `origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridIndex {
    origin: Point,
    cell: Size,
    rows: usize,
    cols: usize,
}

impl GridIndex {
    /// Creates a grid. Non-positive cell sizes produce a grid that never hits.
    #[must_use]
    pub fn new(origin: Point, cell: Size, rows: usize, cols: usize) -> Self {
        Self {
            origin,
            cell,
            rows,
            cols,
        }
    }

    /// Returns the grid dimensions as `(rows, cols)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the bounds of a cell.
    #[must_use]
    pub fn cell_rect(&self, cell: GridCell) -> Rect {
        let x = self.origin.x + self.cell.width * cell.col as f64;
        let y = self.origin.y + self.cell.height * cell.row as f64;
        Rect::new(x, y, x + self.cell.width, y + self.cell.height)
    }

    /// Returns the cell containing `p`, if any.
    #[must_use]
    pub fn query(&self, p: Point) -> Option<GridCell> {
        if !(self.cell.width > 0.0 && self.cell.height > 0.0) {
            return None;
        }
        let col = ((p.x - self.origin.x) / self.cell.width).floor();
        let row = ((p.y - self.origin.y) / self.cell.height).floor();
        if !(col >= 0.0 && row >= 0.0) || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        #[expect(clippy::cast_possible_truncation, reason = "bounds checked above")]
        let cell = GridCell {
            row: row as usize,
            col: col as usize,
        };
        Some(cell)
    }
}

impl HitTester for GridIndex {
    type Target = GridCell;

    fn hit(&self, pos: Point) -> Option<GridCell> {
        self.query(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_resolve_by_floor_division() {
        let grid = GridIndex::new(Point::new(10.0, 20.0), Size::new(5.0, 4.0), 3, 4);
        assert_eq!(grid.query(Point::new(10.0, 20.0)), Some(GridCell { row: 0, col: 0 }));
        assert_eq!(grid.query(Point::new(24.9, 31.9)), Some(GridCell { row: 2, col: 2 }));
        assert_eq!(grid.query(Point::new(29.99, 20.0)), Some(GridCell { row: 0, col: 3 }));
    }

    #[test]
    fn outside_and_degenerate_grids_miss() {
        let grid = GridIndex::new(Point::ZERO, Size::new(5.0, 5.0), 2, 2);
        assert_eq!(grid.query(Point::new(-0.1, 1.0)), None, "left of grid");
        assert_eq!(grid.query(Point::new(10.0, 1.0)), None, "right edge exclusive");
        assert_eq!(grid.query(Point::new(1.0, f64::NAN)), None, "NaN");
        let flat = GridIndex::new(Point::ZERO, Size::new(0.0, 5.0), 2, 2);
        assert_eq!(flat.query(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn cell_rect_matches_query() {
        let grid = GridIndex::new(Point::new(1.0, 1.0), Size::new(2.0, 3.0), 4, 4);
        let cell = GridCell { row: 2, col: 1 };
        let rect = grid.cell_rect(cell);
        assert_eq!(rect, Rect::new(3.0, 7.0, 5.0, 10.0));
        assert_eq!(grid.hit(rect.center()), Some(cell));
    }
}
