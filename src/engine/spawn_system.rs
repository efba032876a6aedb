use super::*;

impl GameSession {
    /// Pursuers wanted at the current level, limited by the base cells.
    pub(super) fn pursuer_target_count(&self) -> usize {
        self.levels
            .get(self.level)
            .max_pursuers
            .min(self.maze.ghost_bases().len())
    }

    /// Appends pursuers on free base cells until the level's count is met.
    /// Existing pursuers keep their ids.
    pub(super) fn spawn_missing_pursuers(&mut self) {
        let target = self.pursuer_target_count();
        let speed = self.levels.get(self.level).pursuer_speed;
        while self.pursuers.len() < target {
            let index = self.pursuers.len();
            let spawn_cell = self.maze.ghost_bases()[index];
            let id = self.next_pursuer_id;
            self.next_pursuer_id += 1;
            self.pursuers.push(PursuerAgent::new(
                id,
                index,
                &self.maze,
                spawn_cell,
                speed,
                self.tuning.clone(),
            ));
        }
    }

    pub(super) fn reset_agents(&mut self) {
        self.player.reset_position();
        for pursuer in &mut self.pursuers {
            pursuer.reset_position();
        }
    }

    pub(super) fn advance_level(&mut self) {
        self.level = (self.level + 1).min(self.levels.last_index());
        let speed = self.levels.get(self.level).pursuer_speed;
        for pursuer in &mut self.pursuers {
            pursuer.set_speed(speed);
        }
        self.spawn_missing_pursuers();
        self.pellets.reset(&self.maze);
        self.reset_agents();
        self.events.push(RuntimeEvent::LevelAdvanced { level: self.level });
    }
}
