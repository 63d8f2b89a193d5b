#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Spellgrid engine.
//!
//! This crate defines the vocabulary that connects the authoritative turn
//! orchestrator with the grid engine, the pure systems and the external
//! brains. The orchestrator sends [`Message`] requests to every seat through
//! the [`Brain`] contract, each brain answers with the matching reply, and
//! every reply is correlated to its request by [`MessageKind`] and [`Tick`].
//! Positions, directions and elemental kinds are plain values so they can
//! cross the brain boundary unchanged.

use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

mod incident;
mod message;

pub use incident::{
    AppliedEffect, EffectKind, EffectPayload, Incident, IncidentKind, IncidentTarget,
};
pub use message::{
    FightOffer, HeldSpellState, MapPayload, Message, MessageBody, MessageKind, PlayerState,
    PlayerUpdate, PortalPlacement, PortalSighting, StatusEffectState,
};

/// Maximum health a player can hold.
pub const MAX_HEALTH: i32 = 100;

/// Largest number of seats a session supports.
///
/// Attacker and tag bookkeeping is stored in `u32` bitmasks.
pub const MAX_PLAYERS: usize = 32;

/// Location of a single grid cell.
///
/// Coordinates are signed so that the [`Position::UNKNOWN`] sentinel can
/// describe players that are dead, unseen or otherwise off the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Sentinel used for dead, unseen or off-map entities.
    pub const UNKNOWN: Self = Self::new(-1, -1);

    /// Creates a new position from column and row coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Reports whether the position refers to an actual cell.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    /// Squared Euclidean distance between two positions.
    #[must_use]
    pub fn distance_squared(self, other: Position) -> u32 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        u32::try_from(dx * dx + dy * dy).unwrap_or(u32::MAX)
    }

    /// Reports whether `other` lies within `radius` cells measured as a circle.
    #[must_use]
    pub fn within_distance(self, other: Position, radius: i32) -> bool {
        let radius = i64::from(radius);
        i64::from(self.distance_squared(other)) <= radius * radius
    }

    /// Neighbouring position one step in the provided direction.
    ///
    /// [`Direction::Any`] yields the position unchanged.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub const fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Facing of a player, or the unset [`Direction::Any`] marker.
///
/// Rows grow toward the south, so north is toward decreasing `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing rows.
    North,
    /// Toward decreasing rows and increasing columns.
    NorthEast,
    /// Toward increasing columns.
    East,
    /// Toward increasing rows and increasing columns.
    SouthEast,
    /// Toward increasing rows.
    South,
    /// Toward increasing rows and decreasing columns.
    SouthWest,
    /// Toward decreasing columns.
    West,
    /// Toward decreasing rows and decreasing columns.
    NorthWest,
    /// No particular facing.
    Any,
}

impl Direction {
    /// The eight real facings in wire order.
    pub const FACINGS: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Reports whether the direction is one of the eight real facings.
    #[must_use]
    pub const fn is_facing(self) -> bool {
        !matches!(self, Direction::Any)
    }

    /// Wire index of the direction, `0..=8`.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::NorthEast => 1,
            Direction::East => 2,
            Direction::SouthEast => 3,
            Direction::South => 4,
            Direction::SouthWest => 5,
            Direction::West => 6,
            Direction::NorthWest => 7,
            Direction::Any => 8,
        }
    }

    /// Decodes a wire index, rejecting anything outside `0..=8`.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        if index == 8 {
            return Some(Direction::Any);
        }
        Self::FACINGS.get(usize::from(index)).copied()
    }

    /// Unit offset travelled when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::Any => (0, 0),
        }
    }

    /// Facing that best points from `from` toward `to`.
    ///
    /// Identical positions yield [`Direction::Any`].
    #[must_use]
    pub fn toward(from: Position, to: Position) -> Self {
        let dx = (to.x() - from.x()).signum();
        let dy = (to.y() - from.y()).signum();
        Self::FACINGS
            .into_iter()
            .find(|direction| direction.offset() == (dx, dy))
            .unwrap_or(Direction::Any)
    }
}

/// Elemental kind shared by portals and spells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    /// Air spells favour pushing targets around.
    Air,
    /// Water spells mix damage with healing.
    Water,
    /// Fire spells trade range for splash damage.
    Fire,
    /// Earth spells are slow and heavy.
    Earth,
}

impl ElementKind {
    /// Every element in wire order.
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Air,
        ElementKind::Water,
        ElementKind::Fire,
        ElementKind::Earth,
    ];

    /// Number of elements, used to size per-element arrays.
    pub const COUNT: usize = 4;

    /// Index into per-element arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            ElementKind::Air => 0,
            ElementKind::Water => 1,
            ElementKind::Fire => 2,
            ElementKind::Earth => 3,
        }
    }

    /// Element addressed by the provided array index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Air => "air",
            ElementKind::Water => "water",
            ElementKind::Fire => "fire",
            ElementKind::Earth => "earth",
        };
        f.write_str(name)
    }
}

/// Seat index of a player, stable for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Creates a new player identifier with the provided seat index.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric seat index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Seat index usable for slice addressing.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask used by attacker and tag bookkeeping.
    #[must_use]
    pub const fn mask(&self) -> u32 {
        1u32 << (self.0 as u32 % 32)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Catalog identifier of a spell. Identifiers start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpellId(u8);

impl SpellId {
    /// Creates a new spell identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Monotonic orchestrator step counter stamped on every message.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Tick(u32);

impl Tick {
    /// Creates a tick with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric tick value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Tick immediately following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Insertion-ordered set of positions with constant-time membership.
///
/// Removal moves the last element into the vacated slot, so ordering is only
/// stable while the set grows.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Position>", into = "Vec<Position>")]
pub struct PositionSet {
    order: Vec<Position>,
    index: HashMap<Position, usize>,
}

impl PositionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` positions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Adds a position, returning `false` when it was already present.
    pub fn insert(&mut self, position: Position) -> bool {
        if self.index.contains_key(&position) {
            return false;
        }
        let _ = self.index.insert(position, self.order.len());
        self.order.push(position);
        true
    }

    /// Removes a position, returning `false` when it was absent.
    pub fn remove(&mut self, position: Position) -> bool {
        let Some(slot) = self.index.remove(&position) else {
            return false;
        };
        let _ = self.order.swap_remove(slot);
        if let Some(moved) = self.order.get(slot).copied() {
            let _ = self.index.insert(moved, slot);
        }
        true
    }

    /// Removes every position contained in `other`.
    pub fn remove_all(&mut self, other: &PositionSet) {
        for position in other.iter() {
            let _ = self.remove(position);
        }
    }

    /// Keeps only the positions accepted by the predicate, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Position) -> bool,
    {
        self.order.retain(|position| keep(*position));
        self.reindex();
    }

    /// Positions contained in both sets, in this set's order.
    #[must_use]
    pub fn intersection(&self, other: &PositionSet) -> PositionSet {
        self.iter().filter(|position| other.contains(*position)).collect()
    }

    /// Reports whether the position is a member of the set.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.index.contains_key(&position)
    }

    /// Randomly permutes the set's ordering.
    pub fn shuffle<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.order.shuffle(rng);
        self.reindex();
    }

    /// Picks a uniformly random member of the set.
    #[must_use]
    pub fn choose<R>(&self, rng: &mut R) -> Option<Position>
    where
        R: Rng + ?Sized,
    {
        self.order.choose(rng).copied()
    }

    /// First position in iteration order.
    #[must_use]
    pub fn first(&self) -> Option<Position> {
        self.order.first().copied()
    }

    /// Number of positions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Reports whether the set holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterator over the positions in order.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.order.iter().copied()
    }

    /// Borrows the ordered positions.
    #[must_use]
    pub fn as_slice(&self) -> &[Position] {
        &self.order
    }

    /// Removes every position.
    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (slot, position) in self.order.iter().enumerate() {
            let _ = self.index.insert(*position, slot);
        }
    }
}

impl PartialEq for PositionSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for PositionSet {}

impl FromIterator<Position> for PositionSet {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut set = PositionSet::new();
        for position in iter {
            let _ = set.insert(position);
        }
        set
    }
}

impl Extend<Position> for PositionSet {
    fn extend<I: IntoIterator<Item = Position>>(&mut self, iter: I) {
        for position in iter {
            let _ = self.insert(position);
        }
    }
}

impl From<Vec<Position>> for PositionSet {
    fn from(positions: Vec<Position>) -> Self {
        positions.into_iter().collect()
    }
}

impl From<PositionSet> for Vec<Position> {
    fn from(set: PositionSet) -> Self {
        set.order
    }
}

/// Decision source for a single seat.
///
/// The orchestrator delivers requests through [`Brain::send`] and collects
/// replies through [`Brain::poll`]. Neither call may block: a poll returns an
/// already queued reply or nothing at all. Requests are shared handles so the
/// orchestrator can keep its correlation copy while the brain holds another.
pub trait Brain {
    /// Delivers a request or broadcast to this seat.
    fn send(&mut self, message: Arc<Message>);

    /// Fetches at most one pending reply without blocking.
    fn poll(&mut self) -> Option<Message>;
}

impl<B> Brain for Box<B>
where
    B: Brain + ?Sized,
{
    fn send(&mut self, message: Arc<Message>) {
        (**self).send(message);
    }

    fn poll(&mut self) -> Option<Message> {
        (**self).poll()
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, ElementKind, PlayerId, Position, PositionSet, SpellId, Tick};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde::{de::DeserializeOwned, Serialize};

    pub(crate) fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn unknown_position_is_not_known() {
        assert!(!Position::UNKNOWN.is_known());
        assert!(Position::new(0, 0).is_known());
        assert!(!Position::new(3, -1).is_known());
    }

    #[test]
    fn distance_squared_is_symmetric() {
        let a = Position::new(1, 1);
        let b = Position::new(4, 5);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
        assert!(a.within_distance(b, 5));
        assert!(!a.within_distance(b, 4));
    }

    #[test]
    fn direction_indices_round_trip() {
        for direction in Direction::FACINGS {
            assert_eq!(Direction::from_index(direction.index()), Some(direction));
            assert!(direction.is_facing());
        }
        assert_eq!(Direction::from_index(8), Some(Direction::Any));
        assert_eq!(Direction::from_index(9), None);
        assert!(!Direction::Any.is_facing());
    }

    #[test]
    fn toward_points_at_target() {
        let origin = Position::new(5, 5);
        assert_eq!(Direction::toward(origin, Position::new(5, 0)), Direction::North);
        assert_eq!(Direction::toward(origin, Position::new(9, 9)), Direction::SouthEast);
        assert_eq!(Direction::toward(origin, Position::new(0, 7)), Direction::SouthWest);
        assert_eq!(Direction::toward(origin, origin), Direction::Any);
    }

    #[test]
    fn element_order_matches_wire_indices() {
        for (index, kind) in ElementKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), index);
            assert_eq!(ElementKind::from_index(index), Some(kind));
        }
    }

    #[test]
    fn position_set_deduplicates_and_swaps_on_remove() {
        let mut set = PositionSet::new();
        assert!(set.insert(Position::new(0, 0)));
        assert!(set.insert(Position::new(1, 0)));
        assert!(set.insert(Position::new(2, 0)));
        assert!(!set.insert(Position::new(1, 0)));
        assert_eq!(set.len(), 3);

        assert!(set.remove(Position::new(0, 0)));
        assert_eq!(
            set.as_slice(),
            &[Position::new(2, 0), Position::new(1, 0)],
        );
        assert!(set.contains(Position::new(2, 0)));
        assert!(!set.contains(Position::new(0, 0)));
        assert!(!set.remove(Position::new(0, 0)));
    }

    #[test]
    fn position_set_shuffle_keeps_membership() {
        let mut set: PositionSet = (0..20).map(|x| Position::new(x, 1)).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        set.shuffle(&mut rng);
        assert_eq!(set.len(), 20);
        for x in 0..20 {
            assert!(set.contains(Position::new(x, 1)));
        }
        assert!(set.remove(Position::new(4, 1)));
        assert_eq!(set.len(), 19);
    }

    #[test]
    fn position_set_retain_and_intersection() {
        let mut set: PositionSet = (0..6).map(|x| Position::new(x, 0)).collect();
        set.retain(|position| position.x() % 2 == 0);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Position::new(4, 0)));

        let other: PositionSet = [Position::new(4, 0), Position::new(5, 0)].into_iter().collect();
        let both = set.intersection(&other);
        assert_eq!(both.as_slice(), &[Position::new(4, 0)]);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&PlayerId::new(3));
        assert_round_trip(&SpellId::new(12));
        assert_round_trip(&Tick::new(99));
        assert_round_trip(&Direction::SouthWest);
        assert_round_trip(&ElementKind::Fire);
    }

    #[test]
    fn position_set_round_trips_through_bincode() {
        let set: PositionSet = [Position::new(3, 4), Position::new(1, 2)].into_iter().collect();
        assert_round_trip(&set);
    }

    #[test]
    fn player_mask_is_single_bit() {
        assert_eq!(PlayerId::new(0).mask(), 1);
        assert_eq!(PlayerId::new(5).mask(), 32);
    }
}
