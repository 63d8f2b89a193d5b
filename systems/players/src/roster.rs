use spellgrid_core::{Direction, ElementKind, PlayerId, PlayerState, PlayerUpdate, Position};

/// Client-side mirror of every seat, rebuilt from player updates.
///
/// Only what the last update revealed is known: players that were not
/// reported keep their counters but lose their position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    me: Option<PlayerId>,
    players: Vec<PlayerState>,
}

impl Roster {
    /// Creates a roster for `count` seats, every seat dead and unseen.
    #[must_use]
    pub fn new(count: u8) -> Self {
        Self {
            me: None,
            players: (0..count).map(|id| blank(PlayerId::new(id))).collect(),
        }
    }

    /// Applies a received update.
    ///
    /// Every position is first marked unknown, then each reported player is
    /// overwritten, the receiver last. Seats beyond the roster are ignored.
    pub fn apply_update(&mut self, update: &PlayerUpdate) {
        for player in &mut self.players {
            player.position = Position::UNKNOWN;
        }

        for other in &update.others {
            self.overwrite(other);
        }
        self.overwrite(&update.me);
        self.me = Some(update.me.id);
    }

    /// Seat of the receiver, known after the first update.
    #[must_use]
    pub const fn me(&self) -> Option<PlayerId> {
        self.me
    }

    /// Last known state of a seat.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(id.index())
    }

    /// Other seats whose position the last update revealed.
    pub fn visible_opponents(&self) -> impl Iterator<Item = &PlayerState> + '_ {
        self.players
            .iter()
            .filter(move |player| Some(player.id) != self.me && player.position.is_known())
    }

    /// Iterates over every seat.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> + '_ {
        self.players.iter()
    }

    fn overwrite(&mut self, state: &PlayerState) {
        if let Some(slot) = self.players.get_mut(state.id.index()) {
            *slot = state.clone();
        }
    }
}

fn blank(id: PlayerId) -> PlayerState {
    PlayerState {
        id,
        position: Position::UNKNOWN,
        facing: Direction::Any,
        health: 0,
        kills: 0,
        deaths: 0,
        spells: [None; ElementKind::COUNT],
        effects: Vec::new(),
    }
}
