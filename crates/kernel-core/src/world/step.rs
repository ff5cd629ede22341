use super::*;

impl World {
    /// Advance the clock one step and, once a full resolution has elapsed, run an actor pass.
    pub fn tick(&mut self) -> Vec<ExecutionResult> {
        let now = self.clock.advance();
        if now - self.last_actor_pass > self.config.resolution {
            self.last_actor_pass = now;
            return self.actor_pass();
        }
        Vec::new()
    }

    /// Give every eligible actor one turn, in creation order.
    ///
    /// The player runs whatever was queued for them (then the queue resets to `wait`);
    /// planning actors run one plan cycle and then accrue their needs.
    pub fn actor_pass(&mut self) -> Vec<ExecutionResult> {
        let now = self.clock.now();
        let mut results = Vec::new();
        for index in 0..self.actors.len() {
            let actor = &self.actors[index];
            let id = actor.id;
            if !actor.is_eligible(now) {
                continue;
            }
            if id == self.player {
                let action = std::mem::take(&mut self.player_action);
                results.push(self.execute(id, action, now));
            } else if actor.capabilities.plans {
                results.push(self.act(id));
                let update_size = self.config.need_update_size;
                self.actors[index].needs.accrue(update_size);
            }
        }
        results
    }

    /// One plan/execute cycle for `actor` at the current time, without need accrual.
    pub fn act(&mut self, actor: ActorId) -> ExecutionResult {
        let now = self.clock.now();
        let action = self
            .plan_for(actor)
            .first()
            .map(|head| head.action)
            .unwrap_or_default();
        self.execute(actor, action, now)
    }

    /// The sorted candidate list `actor` would choose from right now.
    pub fn plan_for(&mut self, actor: ActorId) -> Vec<PlanEntry> {
        let Some(state) = self.actors.get(actor.index()) else {
            return Vec::new();
        };
        let view = PlanningView {
            graph: &self.graph,
            entities: &self.entities,
            actors: &self.actors,
            now: self.clock.now(),
        };
        let plan = NeedPlanner::plan(state, &view, &self.planner, &mut self.rng);
        if let Some(head) = plan.first() {
            debug!(
                "{actor} chose {:?} at priority {:.2} ({} candidates)",
                head.action,
                head.priority,
                plan.len()
            );
        }
        plan
    }

    fn execute(&mut self, actor: ActorId, action: Action, now: f64) -> ExecutionResult {
        let mut ctx = ExecutionContext {
            graph: &mut self.graph,
            entities: &mut self.entities,
            actors: &mut self.actors,
            rng: &mut self.rng,
        };
        ctx.execute(actor, action, now)
    }

    /// One host frame at real time `real_now`: pace, tick, and render what the player perceives.
    pub fn frame(&mut self, real_now: Duration) -> Vec<String> {
        let ready_at = self
            .player_actor()
            .map(Actor::next_eligible)
            .unwrap_or_default();
        let ticks =
            self.pacer
                .ticks_for_frame(real_now, self.clock.now(), ready_at, self.clock.step());
        let mut results = Vec::new();
        for _ in 0..ticks {
            results.extend(self.tick());
        }
        self.report(&results)
    }

    /// Tick until `seconds` of simulated time have passed, returning every result.
    pub fn run_for(&mut self, seconds: f64) -> Vec<ExecutionResult> {
        let until = self.clock.now() + seconds.max(0.0);
        let mut results = Vec::new();
        if self.clock.step() <= 0.0 {
            return results;
        }
        while self.clock.now() < until {
            results.extend(self.tick());
        }
        results
    }
}
