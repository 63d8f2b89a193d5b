//! Property checks for the grid engine.

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;
use spellgrid_core::{Direction, Position};
use spellgrid_world::Grid;

fn shortest_paths(grid: &Grid, from: Position) -> HashMap<Position, u32> {
    let mut distances = HashMap::from([(from, 0)]);
    let mut queue = VecDeque::from([from]);
    while let Some(cell) = queue.pop_front() {
        let next_distance = distances[&cell] + 1;
        for direction in [Direction::North, Direction::East, Direction::South, Direction::West] {
            let next = cell.step(direction);
            if grid.is_traversable(next) && !distances.contains_key(&next) {
                let _ = distances.insert(next, next_distance);
                queue.push_back(next);
            }
        }
    }
    distances
}

fn arena(seed: u64) -> Grid {
    Grid::generate(18, 14, 20, seed).expect("grid")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn valid_moves_match_shortest_paths(seed in any::<u64>(), pick in any::<usize>(), steps in 1u8..24) {
        let grid = arena(seed);
        let spaces = grid.open_spaces();
        prop_assume!(!spaces.is_empty());
        let from = spaces.as_slice()[pick % spaces.len()];

        let moves = grid.valid_moves(from, steps);
        let distances = shortest_paths(&grid, from);

        for cell in moves.iter() {
            prop_assert!(!grid.is_wall(cell), "{cell} is a wall");
            let cost = distances.get(&cell).copied();
            prop_assert!(cost.is_some_and(|cost| cost < u32::from(steps)), "{cell} costs {cost:?}");
        }
        for (cell, cost) in &distances {
            if *cost < u32::from(steps) {
                prop_assert!(moves.contains(*cell), "{cell} at cost {cost} missing");
            }
        }
    }

    #[test]
    fn line_of_sight_is_symmetric(seed in any::<u64>(), a in any::<usize>(), b in any::<usize>()) {
        let grid = arena(seed);
        let spaces = grid.open_spaces();
        prop_assume!(!spaces.is_empty());
        let first = spaces.as_slice()[a % spaces.len()];
        let second = spaces.as_slice()[b % spaces.len()];

        prop_assert_eq!(grid.has_los(first, second), grid.has_los(second, first));
        prop_assert!(grid.has_los(first, first));
    }

    #[test]
    fn visible_cells_are_never_walls(seed in any::<u64>(), pick in any::<usize>(), facing in 0u8..9) {
        let grid = arena(seed);
        let spaces = grid.open_spaces();
        prop_assume!(!spaces.is_empty());
        let from = spaces.as_slice()[pick % spaces.len()];
        let direction = Direction::from_index(facing).expect("facing");

        let visible = grid.line_of_sight(from, direction);
        for cell in visible.iter() {
            prop_assert!(!grid.is_wall(cell));
            prop_assert!(grid.has_los(from, cell));
        }
    }

    #[test]
    fn map_payload_restores_walls_and_portals(seed in any::<u64>(), portal in any::<usize>()) {
        let mut grid = arena(seed);
        let spaces = grid.open_spaces().clone();
        prop_assume!(!spaces.is_empty());
        let portal = spaces.as_slice()[portal % spaces.len()];
        grid.set_portal(portal);

        let placements = vec![spellgrid_core::PortalPlacement {
            position: portal,
            kind: spellgrid_core::ElementKind::Fire,
        }];
        let rebuilt = Grid::from_map_payload(&grid.to_map_payload(placements, 2)).expect("rebuild");

        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let cell = Position::new(x, y);
                prop_assert_eq!(rebuilt.is_wall(cell), grid.is_wall(cell));
            }
        }
        prop_assert_eq!(rebuilt.portals(), grid.portals());
    }
}
