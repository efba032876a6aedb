use crate::maze::MazeGrid;
use crate::motion::Body;
use crate::rng::RandomSource;
use crate::types::Position;

/// Read-only world facts handed to an agent for one move.
pub struct MoveContext<'a> {
    pub maze: &'a MazeGrid,
    /// Player center. Pursuers see it after the player moved this tick.
    pub player_position: Position,
    pub rng: &'a mut dyn RandomSource,
}

/// Capability shared by the player and the pursuers.
pub trait Actor {
    fn body(&self) -> &Body;

    /// Advances one tick and returns the distance travelled.
    fn advance(&mut self, ctx: &mut MoveContext<'_>) -> f32;

    fn reset_position(&mut self);

    fn position(&self) -> Position {
        self.body().position
    }
}
