use crate::game::players::{Player, PlayerContainer, PlayerId};
use log::info;

/// An active gameplay session. Holds its own roster so players can drop out
/// mid-song without touching the menu-side container.
#[derive(Debug, Clone)]
pub struct GameSession {
    players: Vec<Player>,
}

impl GameSession {
    pub fn start(container: &PlayerContainer) -> Self {
        info!("Starting gameplay session with {} player(s)", container.len());
        Self {
            players: container.players().to_vec(),
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn join(&mut self, player: Player) -> bool {
        if self.players.iter().any(|p| p.id == player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn leave(&mut self, id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(idx))
    }

    pub fn set_display(&mut self, id: PlayerId, display_number: usize) -> Option<usize> {
        let player = self.players.iter_mut().find(|p| p.id == id)?;
        Some(std::mem::replace(&mut player.display_number, display_number))
    }
}

/// The roster display routing is derived from: the session's players while
/// gameplay runs, otherwise the global container.
#[derive(Debug, Clone, Copy)]
pub struct Roster<'a> {
    players: &'a [Player],
    in_session: bool,
}

impl<'a> Roster<'a> {
    pub fn resolve(session: Option<&'a GameSession>, container: &'a PlayerContainer) -> Self {
        match session {
            Some(session) => Self {
                players: session.players(),
                in_session: true,
            },
            None => Self {
                players: container.players(),
                in_session: false,
            },
        }
    }

    pub const fn players(&self) -> &'a [Player] {
        self.players
    }

    pub const fn in_session(&self) -> bool {
        self.in_session
    }

    /// True if any player is assigned to `display_number`.
    pub fn references(&self, display_number: usize) -> bool {
        self.players
            .iter()
            .any(|p| p.display_number == display_number)
    }
}

#[cfg(test)]
mod tests {
    use super::{GameSession, Roster};
    use crate::game::players::{Player, PlayerContainer, PlayerId};

    #[test]
    fn roster_prefers_session_players() {
        let mut container = PlayerContainer::new();
        container.join(Player::new(PlayerId::P1, 2));
        let mut session = GameSession::start(&container);
        session.set_display(PlayerId::P1, 3);

        let menu = Roster::resolve(None, &container);
        assert!(!menu.in_session());
        assert!(menu.references(2));

        let gameplay = Roster::resolve(Some(&session), &container);
        assert!(gameplay.in_session());
        assert!(gameplay.references(3));
        assert!(!gameplay.references(2), "session roster is a snapshot");
    }

    #[test]
    fn empty_roster_references_nothing() {
        let container = PlayerContainer::new();
        let roster = Roster::resolve(None, &container);
        assert!(roster.players().is_empty());
        assert!(!roster.references(1));
    }

    #[test]
    fn session_join_and_leave() {
        let container = PlayerContainer::new();
        let mut session = GameSession::start(&container);
        assert!(session.join(Player::new(PlayerId::P2, 2)));
        assert!(!session.join(Player::new(PlayerId::P2, 3)));
        assert_eq!(session.leave(PlayerId::P2).map(|p| p.display_number), Some(2));
        assert!(session.players().is_empty());
    }
}
