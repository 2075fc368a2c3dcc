use thiserror::Error;

/// Everything that can go wrong while configuring or playing a game.
///
/// Rule problems are reported when a ruleset is put together, play
/// problems when a session is asked to do something its state does not
/// allow. Neither leaves the reporting object changed.
#[derive(Debug, Error)]
pub enum GameError {
    /// The move or action is not available in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
    /// The rule document contradicts itself or the board it describes.
    #[error("invalid ruleset: {0}")]
    InvalidRuleset(String),
    /// Undo was requested with no moves behind the present.
    #[error("nothing left to undo")]
    NothingToUndo,
    /// Redo was requested with no undone moves ahead of the present.
    #[error("nothing left to redo")]
    NothingToRedo,
}

impl GameError {
    #[inline]
    pub(crate) fn illegal(msg: impl Into<String>) -> Self {
        Self::IllegalMove(msg.into())
    }

    #[inline]
    pub(crate) fn ruleset(msg: impl Into<String>) -> Self {
        Self::InvalidRuleset(msg.into())
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[test]
fn errors_read_well() {
    let e = GameError::illegal("no piece on e4");
    assert_eq!(e.to_string(), "illegal move: no piece on e4");
    let e = GameError::ruleset("the board is too small");
    assert_eq!(e.to_string(), "invalid ruleset: the board is too small");
    assert_eq!(GameError::NothingToUndo.to_string(), "nothing left to undo");
}
