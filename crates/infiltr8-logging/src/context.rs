//! Player context injection
//!
//! Thread-local storage for the acting player, so every span opened while
//! a [`PlayerContextGuard`] is alive can be attributed to that player.

use std::cell::RefCell;

use infiltr8_core::UserId;
use uuid::Uuid;

/// Player context stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerContextData {
    pub player: UserId,
    /// Identifies one shell or client connection of the player
    pub connection_id: Uuid,
}

thread_local! {
    static PLAYER_CONTEXT: RefCell<Option<PlayerContextData>> = const { RefCell::new(None) };
}

/// RAII guard for player context
///
/// Creating the guard sets the acting player for the current thread;
/// dropping it restores whatever was set before.
///
/// # Example
///
/// ```
/// use infiltr8_core::UserId;
/// use infiltr8_logging::context::PlayerContextGuard;
///
/// let player = UserId::from("testuser");
/// let _guard = PlayerContextGuard::new(&player);
/// assert_eq!(PlayerContextGuard::current_player(), Some(player));
/// ```
pub struct PlayerContextGuard {
    previous: Option<PlayerContextData>,
}

impl PlayerContextGuard {
    pub fn new(player: &UserId) -> Self {
        Self::with_connection_id(player, Uuid::new_v4())
    }

    /// Use a known connection id, e.g. one assigned by a front end
    pub fn with_connection_id(player: &UserId, connection_id: Uuid) -> Self {
        let data = PlayerContextData {
            player: player.clone(),
            connection_id,
        };
        let previous = PLAYER_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));
        Self { previous }
    }

    pub fn current() -> Option<PlayerContextData> {
        PLAYER_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_player() -> Option<UserId> {
        Self::current().map(|ctx| ctx.player)
    }

    pub fn current_connection_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.connection_id)
    }
}

impl Drop for PlayerContextGuard {
    fn drop(&mut self) {
        PLAYER_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block with the given player as context
///
/// ```ignore
/// with_player_context!(&player, {
///     engine.scan(&player)?;
/// });
/// ```
#[macro_export]
macro_rules! with_player_context {
    ($player:expr, $body:block) => {{
        let _guard = $crate::context::PlayerContextGuard::new($player);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_context_guard() {
        assert!(PlayerContextGuard::current().is_none());

        let player = UserId::from("neo");
        {
            let _guard = PlayerContextGuard::new(&player);
            let ctx = PlayerContextGuard::current().unwrap();
            assert_eq!(ctx.player, player);
        }

        assert!(PlayerContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        let neo = UserId::from("neo");
        let trinity = UserId::from("trinity");

        {
            let _outer = PlayerContextGuard::new(&neo);
            {
                let _inner = PlayerContextGuard::new(&trinity);
                assert_eq!(PlayerContextGuard::current_player(), Some(trinity.clone()));
            }
            // restored after the inner guard drops
            assert_eq!(PlayerContextGuard::current_player(), Some(neo.clone()));
        }

        assert!(PlayerContextGuard::current_player().is_none());
    }

    #[test]
    fn test_with_connection_id() {
        let id = Uuid::new_v4();
        let _guard = PlayerContextGuard::with_connection_id(&UserId::from("morpheus"), id);
        assert_eq!(PlayerContextGuard::current_connection_id(), Some(id));
    }

    #[test]
    fn test_macro_scopes_context() {
        let player = UserId::from("switch");
        let seen = with_player_context!(&player, { PlayerContextGuard::current_player() });
        assert_eq!(seen, Some(player));
        assert!(PlayerContextGuard::current().is_none());
    }
}
