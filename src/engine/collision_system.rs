use super::*;
use crate::types::PelletKind;

impl GameSession {
    /// Fleeing pursuers are eaten; any other non-returning contact costs a
    /// life and resets every agent, ending the scan for this tick.
    pub(super) fn resolve_pursuer_collisions(&mut self) {
        let player_position = self.player.position();
        for idx in 0..self.pursuers.len() {
            if !self.pursuers[idx].collides_with(player_position) {
                continue;
            }
            let pursuer_id = self.pursuers[idx].id();
            match self.pursuers[idx].state() {
                AiState::Flee => {
                    if self.pursuers[idx].start_returning(&self.maze) {
                        let points = self.config.scoring.ghost;
                        self.score += points;
                        self.events.push(RuntimeEvent::PursuerEaten { pursuer_id, points });
                    }
                }
                AiState::Returning => {}
                AiState::Patrol | AiState::Chase => {
                    self.lives = self.lives.saturating_sub(1);
                    self.events.push(RuntimeEvent::LifeLost {
                        pursuer_id,
                        lives_left: self.lives,
                    });
                    self.reset_agents();
                    break;
                }
            }
        }
    }

    pub(super) fn consume_pellet(&mut self) {
        let position = self.player.position();
        let cell = self.maze.cell_at(position);
        match self.pellets.consume_at(position) {
            PelletKind::None => {}
            PelletKind::Normal => {
                self.score += self.config.scoring.normal_pellet;
                self.events.push(RuntimeEvent::PelletEaten {
                    x: cell.x,
                    y: cell.y,
                });
            }
            PelletKind::Power => {
                self.score += self.config.scoring.power_pellet;
                self.events.push(RuntimeEvent::PowerPelletEaten {
                    x: cell.x,
                    y: cell.y,
                });
                let duration = self.levels.get(self.level).vulnerability_duration_ticks;
                for pursuer in &mut self.pursuers {
                    pursuer.make_vulnerable(duration);
                }
            }
        }
    }
}
