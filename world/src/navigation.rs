//! Movement flood fill, spawn selection and push/pull projection.

use std::collections::HashMap;

use rand::Rng;
use spellgrid_core::{Direction, Position, PositionSet};

use crate::{visibility::Trace, Grid};

/// Expansion order of the movement flood fill.
const FLOOD_DIRECTIONS: [Direction; 4] = [
    Direction::West,
    Direction::East,
    Direction::North,
    Direction::South,
];

impl Grid {
    /// Cells reachable from `from` through open cells.
    ///
    /// `steps` counts the origin itself, so a budget of one yields only the
    /// origin and every returned cell lies at most `steps - 1` orthogonal moves
    /// away. A cell is expanded again only when it is reached with a strictly
    /// larger remaining budget than before.
    #[must_use]
    pub fn valid_moves(&self, from: Position, steps: u8) -> PositionSet {
        let mut reached = PositionSet::new();
        let mut ranks = HashMap::new();
        self.flood(from, steps, &mut ranks, &mut reached);
        reached
    }

    fn flood(
        &self,
        at: Position,
        steps: u8,
        ranks: &mut HashMap<Position, u8>,
        reached: &mut PositionSet,
    ) {
        if steps == 0 || !self.is_traversable(at) {
            return;
        }
        if ranks.get(&at).is_some_and(|rank| *rank >= steps) {
            return;
        }
        let _ = ranks.insert(at, steps);
        let _ = reached.insert(at);

        for direction in FLOOD_DIRECTIONS {
            self.flood(at.step(direction), steps - 1, ranks, reached);
        }
    }

    /// Picks up to `count` spawn cells away from portals and players.
    ///
    /// Cells within `safe_zone` movement steps of any portal or player are
    /// excluded, as is every cell a player can currently trace a line to.
    /// The survivors are shuffled and picked greedily, each pick excluding its
    /// own safe zone from later picks.
    pub fn valid_spawns<R>(&self, count: usize, safe_zone: u8, rng: &mut R) -> PositionSet
    where
        R: Rng + ?Sized,
    {
        let mut candidates = self.spaces.clone();

        for portal in self.portals.iter() {
            candidates.remove_all(&self.valid_moves(portal, safe_zone));
        }

        for player in self.players.iter() {
            candidates.remove_all(&self.valid_moves(player, safe_zone));
            candidates.retain(|cell| !self.has_los(player, cell));
        }

        candidates.shuffle(rng);
        if candidates.len() <= count {
            return candidates;
        }

        let mut picked = PositionSet::with_capacity(count);
        while picked.len() < count {
            let Some(pick) = candidates.first() else {
                break;
            };
            let _ = picked.insert(pick);
            candidates.remove_all(&self.valid_moves(pick, safe_zone));
            let _ = candidates.remove(pick);
        }
        picked
    }

    /// Open cells that hold neither a player nor a portal.
    #[must_use]
    pub fn empty_spaces(&self) -> PositionSet {
        self.spaces
            .iter()
            .filter(|cell| !self.players.contains(*cell) && !self.portals.contains(*cell))
            .collect()
    }

    /// Last traversable cell on the straight line from `from` toward `to`.
    ///
    /// The trace stops in front of the first wall or the grid border. When
    /// `from` itself cannot be stood on it is returned unchanged.
    #[must_use]
    pub fn ends_up_at(&self, from: Position, to: Position) -> Position {
        if !self.is_traversable(from) {
            return from;
        }

        let mut last = from;
        for cell in Trace::new(from, to) {
            if !self.is_traversable(cell) {
                break;
            }
            last = cell;
        }
        last
    }

    /// Where `target` lands after being knocked `steps` cells away from
    /// `attacker`.
    #[must_use]
    pub fn push(&self, attacker: Position, target: Position, steps: i32) -> Position {
        let dx = target.x() - attacker.x();
        let dy = target.y() - attacker.y();
        let scale = dx.abs().max(dy.abs());
        if scale == 0 || steps <= 0 {
            return target;
        }

        let destination = Position::new(
            target.x() + dx * steps / scale,
            target.y() + dy * steps / scale,
        );
        self.ends_up_at(target, destination)
    }

    /// Where `target` lands after being dragged up to `steps` cells toward
    /// `attacker`, stopping no closer than the neighbouring cell.
    #[must_use]
    pub fn pull(&self, attacker: Position, target: Position, steps: i32) -> Position {
        let dx = attacker.x() - target.x();
        let dy = attacker.y() - target.y();
        let scale = dx.abs().max(dy.abs());
        let steps = steps.min(scale - 1);
        if steps <= 0 {
            return target;
        }

        let destination = Position::new(
            target.x() + dx * steps / scale,
            target.y() + dy * steps / scale,
        );
        self.ends_up_at(target, destination)
    }

    /// Candidate nearest to `from`, ignoring cells that cannot be stood on.
    ///
    /// Ties keep the earliest candidate.
    #[must_use]
    pub fn closest(&self, from: Position, candidates: &PositionSet) -> Option<Position> {
        let mut best: Option<(u32, Position)> = None;
        for candidate in candidates.iter() {
            if !self.is_traversable(candidate) {
                continue;
            }
            let distance = from.distance_squared(candidate);
            if best.map_or(true, |(current, _)| distance < current) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, position)| position)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use spellgrid_core::{Position, PositionSet};

    use crate::Grid;

    fn divided_grid() -> Grid {
        // A wall column at x = 2 leaves a single gap on the bottom row.
        let mut grid = Grid::open(5, 5).expect("grid");
        for y in 0..4 {
            grid.set_wall(Position::new(2, y));
        }
        grid
    }

    #[test]
    fn valid_moves_counts_the_origin() {
        let grid = Grid::open(9, 9).expect("grid");
        let center = Position::new(4, 4);

        assert!(grid.valid_moves(center, 0).is_empty());
        assert_eq!(grid.valid_moves(center, 1).as_slice(), &[center]);

        let ring = grid.valid_moves(center, 2);
        assert_eq!(ring.len(), 5);
        assert!(ring.contains(Position::new(3, 4)));
        assert!(!ring.contains(Position::new(3, 3)));
        assert_eq!(grid.valid_moves(center, 3).len(), 13);
    }

    #[test]
    fn valid_moves_walks_around_walls() {
        let grid = divided_grid();
        let from = Position::new(0, 0);
        let across = Position::new(3, 0);

        // Down four rows, across three columns, up four rows.
        assert!(!grid.valid_moves(from, 11).contains(across));
        assert!(grid.valid_moves(from, 12).contains(across));
        assert!(grid
            .valid_moves(from, 12)
            .iter()
            .all(|cell| !grid.is_wall(cell)));
    }

    #[test]
    fn valid_moves_from_wall_or_outside_is_empty() {
        let grid = divided_grid();
        assert!(grid.valid_moves(Position::new(2, 0), 5).is_empty());
        assert!(grid.valid_moves(Position::UNKNOWN, 5).is_empty());
    }

    #[test]
    fn valid_spawns_avoid_players_and_their_sight() {
        let mut grid = Grid::open(21, 7).expect("grid");
        for y in 0..7 {
            grid.set_wall(Position::new(10, y));
        }
        grid.set_player(Position::new(2, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let spawns = grid.valid_spawns(2, 3, &mut rng);
        assert_eq!(spawns.len(), 2);
        assert!(spawns.iter().all(|cell| cell.x() > 10));

        let first = spawns.first().expect("spawn");
        let zone = grid.valid_moves(first, 3);
        assert!(spawns.iter().skip(1).all(|cell| !zone.contains(cell)));
    }

    #[test]
    fn valid_spawns_keep_clear_of_portals() {
        let mut grid = Grid::open(12, 12).expect("grid");
        grid.set_portal(Position::new(6, 6));
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let spawns = grid.valid_spawns(4, 4, &mut rng);
        let zone = grid.valid_moves(Position::new(6, 6), 4);
        assert_eq!(spawns.len(), 4);
        assert!(spawns.iter().all(|cell| !zone.contains(cell)));
    }

    #[test]
    fn valid_spawns_with_zero_safe_zone_terminates() {
        let grid = Grid::open(4, 4).expect("grid");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let spawns = grid.valid_spawns(3, 0, &mut rng);
        assert_eq!(spawns.len(), 3);
    }

    #[test]
    fn empty_spaces_skip_players_and_portals() {
        let mut grid = Grid::open(3, 3).expect("grid");
        grid.set_player(Position::new(0, 0));
        grid.set_portal(Position::new(1, 1));
        grid.set_wall(Position::new(2, 2));

        let empty = grid.empty_spaces();
        assert_eq!(empty.len(), 6);
        assert!(!empty.contains(Position::new(0, 0)));
        assert!(!empty.contains(Position::new(1, 1)));
    }

    #[test]
    fn ends_up_at_stops_in_front_of_walls_and_border() {
        let mut grid = Grid::open(10, 10).expect("grid");
        grid.set_wall(Position::new(5, 2));

        assert_eq!(
            grid.ends_up_at(Position::new(2, 2), Position::new(8, 2)),
            Position::new(4, 2)
        );
        assert_eq!(
            grid.ends_up_at(Position::new(7, 7), Position::new(14, 7)),
            Position::new(9, 7)
        );
        assert_eq!(
            grid.ends_up_at(Position::new(5, 2), Position::new(8, 2)),
            Position::new(5, 2)
        );
    }

    #[test]
    fn push_moves_away_from_the_attacker() {
        let grid = Grid::open(10, 10).expect("grid");
        let attacker = Position::new(1, 1);

        assert_eq!(
            grid.push(attacker, Position::new(3, 1), 2),
            Position::new(5, 1)
        );
        assert_eq!(
            grid.push(attacker, Position::new(3, 3), 3),
            Position::new(6, 6)
        );
        assert_eq!(
            grid.push(attacker, Position::new(8, 1), 5),
            Position::new(9, 1)
        );
        assert_eq!(grid.push(attacker, attacker, 3), attacker);
    }

    #[test]
    fn pull_stops_next_to_the_attacker() {
        let grid = Grid::open(10, 10).expect("grid");
        let attacker = Position::new(1, 1);

        assert_eq!(
            grid.pull(attacker, Position::new(6, 1), 10),
            Position::new(2, 1)
        );
        assert_eq!(
            grid.pull(attacker, Position::new(6, 1), 2),
            Position::new(4, 1)
        );
        assert_eq!(
            grid.pull(attacker, Position::new(2, 2), 4),
            Position::new(2, 2)
        );
    }

    #[test]
    fn closest_prefers_first_of_equal_candidates() {
        let mut grid = Grid::open(6, 6).expect("grid");
        grid.set_wall(Position::new(2, 2));
        let candidates: PositionSet = vec![
            Position::new(2, 2),
            Position::new(4, 3),
            Position::new(3, 4),
            Position::new(5, 5),
        ]
        .into();

        assert_eq!(
            grid.closest(Position::new(3, 3), &candidates),
            Some(Position::new(4, 3))
        );
        assert_eq!(grid.closest(Position::new(0, 0), &PositionSet::new()), None);
    }
}
