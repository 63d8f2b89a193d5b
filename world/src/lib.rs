#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid engine for Spellgrid.
//!
//! The [`Grid`] stores one flag byte per cell and mirrors the player and
//! portal flags into ordered position sets so both "what is at this cell" and
//! "where are all portals" are cheap. Every query tolerates coordinates
//! outside the grid: predicates answer `false`, set-producing queries answer
//! an empty set and mutations become no-ops.

use bitflags::bitflags;
use spellgrid_core::{MapPayload, PortalPlacement, Position, PositionSet};
use thiserror::Error;

mod generation;
mod navigation;
mod visibility;

bitflags! {
    /// Flag bits stored for each cell.
    ///
    /// The bit layout is shared with the raw bytes of the map payload.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// Impassable, blocks line of sight.
        const WALL = 1 << 1;
        /// Hosts a portal.
        const PORTAL = 1 << 2;
        /// Occupied by at least one living player.
        const PLAYER = 1 << 3;
    }
}

/// Errors raised while building a grid.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Width or height is too small to hold a playable interior.
    #[error("grid dimensions {width}x{height} are too small")]
    InvalidDimensions {
        /// Requested number of columns.
        width: i32,
        /// Requested number of rows.
        height: i32,
    },
    /// Room factor must be positive.
    #[error("room factor must be greater than zero")]
    InvalidRoomFactor,
    /// The payload does not hold one byte per cell.
    #[error("map payload holds {actual} cells, expected {expected}")]
    CellCountMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },
    /// A portal in the payload lies outside the grid.
    #[error("portal at {0} lies outside the grid")]
    PortalOutOfBounds(Position),
}

/// Fixed-size two-dimensional cell array with player and portal mirrors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<CellFlags>,
    spaces: PositionSet,
    players: PositionSet,
    portals: PositionSet,
}

impl Grid {
    /// Creates a grid where every cell is walled.
    pub(crate) fn walled(width: i32, height: i32) -> Result<Self, GridError> {
        let count = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![CellFlags::WALL; count],
            spaces: PositionSet::with_capacity(count),
            players: PositionSet::new(),
            portals: PositionSet::new(),
        })
    }

    /// Creates a grid without any walls.
    pub fn open(width: i32, height: i32) -> Result<Self, GridError> {
        let count = cell_count(width, height)?;
        let mut spaces = PositionSet::with_capacity(count);
        for y in 0..height {
            for x in 0..width {
                let _ = spaces.insert(Position::new(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            cells: vec![CellFlags::empty(); count],
            spaces,
            players: PositionSet::new(),
            portals: PositionSet::new(),
        })
    }

    /// Rebuilds a grid from a received map payload.
    ///
    /// Walls and portals are restored; player flags are not carried.
    pub fn from_map_payload(payload: &MapPayload) -> Result<Self, GridError> {
        let expected = cell_count(payload.width, payload.height)?;
        if payload.cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: payload.cells.len(),
            });
        }

        let mut grid = Self {
            width: payload.width,
            height: payload.height,
            cells: payload
                .cells
                .iter()
                .map(|byte| CellFlags::from_bits_truncate(*byte) & CellFlags::WALL)
                .collect(),
            spaces: PositionSet::with_capacity(expected),
            players: PositionSet::new(),
            portals: PositionSet::new(),
        };

        for placement in &payload.portals {
            if !grid.contains(placement.position) {
                return Err(GridError::PortalOutOfBounds(placement.position));
            }
            grid.set_portal(placement.position);
        }

        for y in 0..grid.height {
            for x in 0..grid.width {
                let position = Position::new(x, y);
                if !grid.is_wall(position) {
                    let _ = grid.spaces.insert(position);
                }
            }
        }

        Ok(grid)
    }

    /// Encodes walls and portals into a map payload.
    #[must_use]
    pub fn to_map_payload(&self, portals: Vec<PortalPlacement>, player_count: u8) -> MapPayload {
        MapPayload {
            width: self.width,
            height: self.height,
            cells: self
                .cells
                .iter()
                .map(|flags| (*flags - CellFlags::PLAYER).bits())
                .collect(),
            portals,
            player_count,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.x() >= 0
            && position.y() >= 0
            && position.x() < self.width
            && position.y() < self.height
    }

    /// Flags stored for the cell, empty outside the grid.
    #[must_use]
    pub fn flags(&self, position: Position) -> CellFlags {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    /// Reports whether the cell is a wall. Out-of-bounds cells are not walls.
    #[must_use]
    pub fn is_wall(&self, position: Position) -> bool {
        self.flags(position).contains(CellFlags::WALL)
    }

    /// Reports whether the cell hosts a portal.
    #[must_use]
    pub fn is_portal(&self, position: Position) -> bool {
        self.flags(position).contains(CellFlags::PORTAL)
    }

    /// Reports whether the cell is occupied by a player.
    #[must_use]
    pub fn is_player(&self, position: Position) -> bool {
        self.flags(position).contains(CellFlags::PLAYER)
    }

    /// Reports whether a walker may stand on the cell.
    #[must_use]
    pub fn is_traversable(&self, position: Position) -> bool {
        self.contains(position) && !self.is_wall(position)
    }

    /// Turns a cell into a wall.
    pub fn set_wall(&mut self, position: Position) {
        if self.insert_flag(position, CellFlags::WALL) {
            let _ = self.spaces.remove(position);
        }
    }

    /// Clears the wall from a cell.
    pub fn unset_wall(&mut self, position: Position) {
        if self.remove_flag(position, CellFlags::WALL) {
            let _ = self.spaces.insert(position);
        }
    }

    /// Marks a cell as hosting a portal.
    pub fn set_portal(&mut self, position: Position) {
        if self.insert_flag(position, CellFlags::PORTAL) {
            let _ = self.portals.insert(position);
        }
    }

    /// Removes the portal marker from a cell.
    pub fn unset_portal(&mut self, position: Position) {
        if self.remove_flag(position, CellFlags::PORTAL) {
            let _ = self.portals.remove(position);
        }
    }

    /// Marks a cell as occupied by a player.
    pub fn set_player(&mut self, position: Position) {
        if self.insert_flag(position, CellFlags::PLAYER) {
            let _ = self.players.insert(position);
        }
    }

    /// Clears the player marker from a cell.
    pub fn unset_player(&mut self, position: Position) {
        if self.remove_flag(position, CellFlags::PLAYER) {
            let _ = self.players.remove(position);
        }
    }

    /// Clears every player marker.
    pub fn clear_players(&mut self) {
        for position in self.players.iter() {
            if let Some(index) = self.index(position) {
                self.cells[index].remove(CellFlags::PLAYER);
            }
        }
        self.players.clear();
    }

    /// Open cells in the order they were carved.
    #[must_use]
    pub fn open_spaces(&self) -> &PositionSet {
        &self.spaces
    }

    /// Cells occupied by players.
    #[must_use]
    pub fn players(&self) -> &PositionSet {
        &self.players
    }

    /// Cells hosting portals.
    #[must_use]
    pub fn portals(&self) -> &PositionSet {
        &self.portals
    }

    /// Occupied cells that fall inside `area`.
    #[must_use]
    pub fn players_in(&self, area: &PositionSet) -> PositionSet {
        self.players.intersection(area)
    }

    /// Portal cells that fall inside `area`.
    #[must_use]
    pub fn portals_in(&self, area: &PositionSet) -> PositionSet {
        self.portals.intersection(area)
    }

    /// Keeps the cells of `area` that lie within `radius` of `center`.
    #[must_use]
    pub fn reduce_to_distance(
        &self,
        center: Position,
        area: &PositionSet,
        radius: i32,
    ) -> PositionSet {
        area.iter()
            .filter(|position| center.within_distance(*position, radius))
            .collect()
    }

    /// Squared distance between two cells.
    #[must_use]
    pub fn distance_squared(&self, from: Position, to: Position) -> u32 {
        from.distance_squared(to)
    }

    /// Reports whether two cells lie within `radius` of each other.
    #[must_use]
    pub fn within_distance(&self, from: Position, to: Position, radius: i32) -> bool {
        from.within_distance(to, radius)
    }

    fn insert_flag(&mut self, position: Position, flag: CellFlags) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        let cell = &mut self.cells[index];
        let changed = !cell.contains(flag);
        cell.insert(flag);
        changed
    }

    fn remove_flag(&mut self, position: Position, flag: CellFlags) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        let cell = &mut self.cells[index];
        let changed = cell.contains(flag);
        cell.remove(flag);
        changed
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let x = usize::try_from(position.x()).ok()?;
        let y = usize::try_from(position.y()).ok()?;
        let height = usize::try_from(self.height).ok()?;
        x.checked_mul(height)?.checked_add(y)
    }
}

fn cell_count(width: i32, height: i32) -> Result<usize, GridError> {
    let invalid = GridError::InvalidDimensions { width, height };
    if width <= 0 || height <= 0 {
        return Err(invalid);
    }
    let columns = usize::try_from(width).map_err(|_| invalid.clone())?;
    let rows = usize::try_from(height).map_err(|_| invalid.clone())?;
    columns.checked_mul(rows).ok_or(invalid)
}
