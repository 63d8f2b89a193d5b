//! Procedural room-and-corridor carving.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spellgrid_core::{Direction, Position, PositionSet};
use tracing::debug;

use crate::{Grid, GridError};

/// Consecutive failed walk steps tolerated before a room stops growing.
const ROOM_WALK_PATIENCE: u32 = 20;
/// Smallest number of cells a room walk aims for.
const ROOM_MIN_CELLS: usize = 5;
/// Upper bound (exclusive) of the room walk length.
const ROOM_MAX_CELLS: usize = 25;
/// Redraws of an already open seed cell allowed per grid cell.
const SEED_REDRAWS_PER_CELL: usize = 8;

const WALK_DIRECTIONS: [Direction; 4] = [
    Direction::West,
    Direction::East,
    Direction::North,
    Direction::South,
];

impl Grid {
    /// Carves a new grid deterministically from `seed`.
    ///
    /// Roughly `width * height / room_factor` rooms are grown by random walks
    /// over interior wall cells, so the outer ring always stays walled. Each
    /// room is joined to the nearest already open cell by an axis-stepping
    /// corridor unless it touches one already.
    pub fn generate(
        width: i32,
        height: i32,
        room_factor: u32,
        seed: u64,
    ) -> Result<Self, GridError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::generate_with(width, height, room_factor, &mut rng)
    }

    /// Carves a new grid using the provided random source.
    pub fn generate_with<R>(
        width: i32,
        height: i32,
        room_factor: u32,
        rng: &mut R,
    ) -> Result<Self, GridError>
    where
        R: Rng + ?Sized,
    {
        if room_factor == 0 {
            return Err(GridError::InvalidRoomFactor);
        }
        if width < 3 || height < 3 {
            return Err(GridError::InvalidDimensions { width, height });
        }

        let mut grid = Grid::walled(width, height)?;
        let cells = grid.cells.len();
        let mut rooms = cells / usize::try_from(room_factor).unwrap_or(usize::MAX);
        let mut redraws_left = cells.saturating_mul(SEED_REDRAWS_PER_CELL);
        let mut carved = 0usize;

        while rooms > 0 {
            let seed = Position::new(rng.gen_range(1..width - 1), rng.gen_range(1..height - 1));
            if !grid.is_wall(seed) {
                if redraws_left == 0 {
                    break;
                }
                redraws_left -= 1;
                continue;
            }

            let size = rng.gen_range(ROOM_MIN_CELLS..ROOM_MAX_CELLS);
            grid.carve_room(seed, size, rng);
            rooms -= 1;
            carved += 1;
        }

        debug!(
            width,
            height,
            rooms = carved,
            open = grid.spaces.len(),
            "generated grid"
        );
        Ok(grid)
    }

    fn carve_room<R>(&mut self, seed: Position, size: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let mut room = PositionSet::with_capacity(size);
        let mut at = seed;
        let mut failures = 0;

        while room.len() < size {
            failures += 1;
            if failures > ROOM_WALK_PATIENCE {
                break;
            }

            let next = at.step(WALK_DIRECTIONS[rng.gen_range(0..WALK_DIRECTIONS.len())]);
            if !self.is_interior(next) || !self.is_wall(next) {
                continue;
            }

            at = next;
            let _ = room.insert(at);
            failures = 0;
        }

        if room.is_empty() {
            return;
        }

        if let Some((from, to)) = self.corridor_endpoints(&room) {
            lay_corridor(&mut room, from, to, rng);
        }

        for cell in room.iter() {
            self.unset_wall(cell);
        }
    }

    /// Closest pair between the room and the carved cells, or `None` when the
    /// room already touches carved space or nothing is carved yet.
    fn corridor_endpoints(&self, room: &PositionSet) -> Option<(Position, Position)> {
        let mut best: Option<(u32, Position, Position)> = None;

        for cell in room.iter() {
            for space in self.spaces.iter() {
                let distance = cell.distance_squared(space);
                if distance <= 1 {
                    return None;
                }
                if best.map_or(true, |(current, _, _)| distance < current) {
                    best = Some((distance, cell, space));
                }
            }
        }

        best.map(|(_, from, to)| (from, to))
    }

    fn is_interior(&self, position: Position) -> bool {
        position.x() > 0
            && position.y() > 0
            && position.x() < self.width - 1
            && position.y() < self.height - 1
    }
}

fn lay_corridor<R>(room: &mut PositionSet, from: Position, to: Position, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let mut at = from;
    while at != to {
        at = axis_step(at, to, rng.gen_bool(0.5));
        if at == to {
            break;
        }
        let _ = room.insert(at);
    }
}

/// Moves one cell toward `to`, preferring the horizontal axis when
/// `horizontal_first` is set and the vertical axis otherwise.
fn axis_step(at: Position, to: Position, horizontal_first: bool) -> Position {
    let dx = (to.x() - at.x()).signum();
    let dy = (to.y() - at.y()).signum();

    if horizontal_first {
        if dx != 0 {
            Position::new(at.x() + dx, at.y())
        } else {
            Position::new(at.x(), at.y() + dy)
        }
    } else if dy != 0 {
        Position::new(at.x(), at.y() + dy)
    } else {
        Position::new(at.x() + dx, at.y())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::axis_step;
    use crate::{Grid, GridError};
    use spellgrid_core::{Direction, Position, PositionSet};

    #[test]
    fn generation_is_deterministic_per_seed() {
        let first = Grid::generate(30, 20, 40, 0x5eed).expect("grid");
        let second = Grid::generate(30, 20, 40, 0x5eed).expect("grid");
        let other = Grid::generate(30, 20, 40, 0x5eee).expect("grid");

        assert_eq!(first, second);
        assert_ne!(first.open_spaces(), other.open_spaces());
    }

    #[test]
    fn generation_keeps_the_border_walled() {
        let grid = Grid::generate(25, 18, 30, 99).expect("grid");
        assert!(!grid.open_spaces().is_empty());

        for x in 0..grid.width() {
            assert!(grid.is_wall(Position::new(x, 0)));
            assert!(grid.is_wall(Position::new(x, grid.height() - 1)));
        }
        for y in 0..grid.height() {
            assert!(grid.is_wall(Position::new(0, y)));
            assert!(grid.is_wall(Position::new(grid.width() - 1, y)));
        }
    }

    #[test]
    fn carved_cells_form_one_connected_region() {
        let grid = Grid::generate(40, 30, 40, 1234).expect("grid");
        let start = grid.open_spaces().first().expect("open cell");
        let mut reachable = PositionSet::new();
        let mut queue = VecDeque::from([start]);
        let _ = reachable.insert(start);
        while let Some(cell) = queue.pop_front() {
            let neighbours = [
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West,
            ];
            for direction in neighbours {
                let next = cell.step(direction);
                if grid.is_traversable(next) && reachable.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        for cell in grid.open_spaces().iter() {
            assert!(reachable.contains(cell), "{cell} is not connected");
        }
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        assert_eq!(
            Grid::generate(10, 10, 0, 1),
            Err(GridError::InvalidRoomFactor)
        );
        assert!(matches!(
            Grid::generate(2, 10, 10, 1),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn axis_step_prefers_requested_axis() {
        let from = Position::new(2, 2);
        let to = Position::new(5, 0);
        assert_eq!(axis_step(from, to, true), Position::new(3, 2));
        assert_eq!(axis_step(from, to, false), Position::new(2, 1));
        assert_eq!(axis_step(Position::new(5, 2), to, true), Position::new(5, 1));
    }
}
