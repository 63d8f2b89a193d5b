//! Directional visibility sweeps and Bresenham line tracing.

use std::ops::Range;

use spellgrid_core::{Direction, Position, PositionSet};

use crate::Grid;

impl Grid {
    /// Cells visible from `from` when looking toward `direction`.
    ///
    /// Each facing selects a half of the grid: the four axis facings cut along
    /// the observer's row or column, the four diagonal facings cut along the
    /// diagonal through the observer. [`Direction::Any`] is the union of the
    /// north and south halves. Every candidate must also pass [`Grid::has_los`].
    #[must_use]
    pub fn line_of_sight(&self, from: Position, direction: Direction) -> PositionSet {
        if !self.contains(from) {
            return PositionSet::new();
        }

        if direction == Direction::Any {
            let mut visible = self.sweep(from, Direction::North);
            visible.extend(self.sweep(from, Direction::South).iter());
            return visible;
        }
        self.sweep(from, direction)
    }

    /// Reports whether an unobstructed straight line joins `a` and `b`.
    ///
    /// Walls block sight, including a wall at either endpoint. The line is
    /// always traced from the smaller to the larger endpoint so the answer
    /// does not depend on argument order.
    #[must_use]
    pub fn has_los(&self, a: Position, b: Position) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        if self.is_wall(a) || self.is_wall(b) {
            return false;
        }
        if a == b {
            return true;
        }

        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Trace::new(start, end).all(|cell| !self.is_wall(cell))
    }

    fn sweep(&self, from: Position, direction: Direction) -> PositionSet {
        let mut visible = PositionSet::new();
        for y in self.sweep_rows(from, direction) {
            for x in self.sweep_columns(from, direction, y) {
                let cell = Position::new(x, y);
                if self.has_los(from, cell) {
                    let _ = visible.insert(cell);
                }
            }
        }
        visible
    }

    fn sweep_rows(&self, from: Position, direction: Direction) -> Range<i32> {
        match direction {
            Direction::North => 0..from.y() + 1,
            Direction::South => from.y()..self.height,
            _ => 0..self.height,
        }
    }

    /// Columns of row `y` that fall on the visible side of the cut.
    fn sweep_columns(&self, from: Position, direction: Direction, y: i32) -> Range<i32> {
        let rows_down = y - from.y();
        let (start, end) = match direction {
            Direction::North | Direction::South | Direction::Any => (0, self.width),
            Direction::West => (0, from.x() + 1),
            Direction::East => (from.x(), self.width),
            Direction::NorthWest => (0, from.x() - rows_down + 1),
            Direction::NorthEast => (from.x() + rows_down, self.width),
            Direction::SouthWest => (0, from.x() + rows_down + 1),
            Direction::SouthEast => (from.x() - rows_down, self.width),
        };
        start.max(0)..end.min(self.width)
    }
}

/// Bresenham walk over every cell between two endpoints, both included.
#[derive(Clone, Debug)]
pub(crate) struct Trace {
    at: Position,
    end: Position,
    dx: i32,
    dy: i32,
    step_x: i32,
    step_y: i32,
    error: i32,
    done: bool,
}

impl Trace {
    pub(crate) fn new(start: Position, end: Position) -> Self {
        let dx = (end.x() - start.x()).abs();
        let dy = -(end.y() - start.y()).abs();
        Self {
            at: start,
            end,
            dx,
            dy,
            step_x: (end.x() - start.x()).signum(),
            step_y: (end.y() - start.y()).signum(),
            error: dx + dy,
            done: false,
        }
    }
}

impl Iterator for Trace {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.at;
        if current == self.end {
            self.done = true;
            return Some(current);
        }

        let doubled = 2 * self.error;
        let mut x = current.x();
        let mut y = current.y();
        if doubled >= self.dy {
            self.error += self.dy;
            x += self.step_x;
        }
        if doubled <= self.dx {
            self.error += self.dx;
            y += self.step_y;
        }
        self.at = Position::new(x, y);
        Some(current)
    }
}
