use std::fmt;

pub const MAX_PLAYERS: usize = 4;

/// Local player number, 1-based (P1..P4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const P1: Self = Self(1);
    #[cfg(test)]
    pub const P2: Self = Self(2);

    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number as usize <= MAX_PLAYERS {
            Some(Self(number))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based index into per-player arrays.
    #[inline(always)]
    pub const fn slot(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=MAX_PLAYERS as u8).map(Self)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 1 = primary display, 2.. = secondary outputs.
    pub display_number: usize,
}

impl Player {
    pub fn new(id: PlayerId, display_number: usize) -> Self {
        Self {
            id,
            name: format!("Player {}", id.number()),
            display_number,
        }
    }
}

/// Players currently joined outside of gameplay, in join order.
#[derive(Debug, Clone, Default)]
pub struct PlayerContainer {
    players: Vec<Player>,
}

impl PlayerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a player with the same id is already joined.
    pub fn join(&mut self, player: Player) -> bool {
        if self.contains(player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn leave(&mut self, id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(idx))
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Reassign a joined player's display. Returns the previous display.
    pub fn set_display(&mut self, id: PlayerId, display_number: usize) -> Option<usize> {
        let player = self.players.iter_mut().find(|p| p.id == id)?;
        Some(std::mem::replace(&mut player.display_number, display_number))
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
