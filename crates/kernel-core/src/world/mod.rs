use std::time::Duration;

mod commands;
mod init;
mod step;

use contracts::{Action, ActorId, ExecutionResult, PlanEntry, SimConfig};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::actor::Actor;
use crate::clock::Clock;
use crate::entity::EntityStore;
use crate::error::WorldError;
use crate::executor::ExecutionContext;
use crate::perception::{Reporter, Scene};
use crate::planner::{NeedPlanner, PlannerConfig, PlanningView};
use crate::scheduler::Pacer;
use crate::spatial::WorldGraph;

pub use commands::CommandError;
pub use init::WorldBuilder;

/// The single owner of all simulation state: clock, graph, items, and actors.
#[derive(Debug, Clone)]
pub struct World {
    config: SimConfig,
    clock: Clock,
    graph: WorldGraph,
    entities: EntityStore,
    actors: Vec<Actor>,
    player: ActorId,
    /// Next action for the player, consumed on their next eligible pass.
    player_action: Action,
    rng: StdRng,
    last_actor_pass: f64,
    planner: PlannerConfig,
    reporter: Reporter,
    pacer: Pacer,
}

impl World {
    fn from_parts(
        config: SimConfig,
        graph: WorldGraph,
        entities: EntityStore,
        actors: Vec<Actor>,
        player: ActorId,
    ) -> Self {
        let clock = Clock::new(config.start_time, config.step);
        info!(
            "world ready: {} locations, {} connections, {} items, {} actors",
            graph.locations().len(),
            graph.connections().len(),
            entities.items().len(),
            actors.len()
        );
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            last_actor_pass: clock.now(),
            planner: PlannerConfig {
                itinerary_urgency: config.itinerary_urgency,
            },
            reporter: Reporter::from_config(&config),
            pacer: Pacer::new(&config),
            clock,
            config,
            graph,
            entities,
            actors,
            player,
            player_action: Action::Wait,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn graph(&self) -> &WorldGraph {
        &self.graph
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.index())
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.index())
    }

    pub fn find_actor(&self, name: &str) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|a| a.proper_name.eq_ignore_ascii_case(name))
            .map(|a| a.id)
    }

    pub fn player(&self) -> ActorId {
        self.player
    }

    pub fn player_actor(&self) -> Option<&Actor> {
        self.actor(self.player)
    }

    pub fn queued_player_action(&self) -> Action {
        self.player_action
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn set_reporter(&mut self, reporter: Reporter) {
        self.reporter = reporter;
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Render results from the player's point of view.
    pub fn report(&self, results: &[ExecutionResult]) -> Vec<String> {
        let scene = Scene {
            graph: &self.graph,
            entities: &self.entities,
            actors: &self.actors,
        };
        self.reporter.report(&scene, self.player, results)
    }

    /// Item ownership and actor placement agree with each other.
    pub fn verify(&self) -> Result<(), String> {
        self.entities.verify_ownership()?;
        for actor in &self.actors {
            let here = self
                .graph
                .location(actor.location)
                .ok_or_else(|| format!("{} stands in unknown {}", actor.id, actor.location))?;
            if !here.actors.contains(&actor.id) {
                return Err(format!("{} missing from {}", actor.id, actor.location));
            }
            let elsewhere = self
                .graph
                .locations()
                .iter()
                .filter(|loc| loc.id != actor.location)
                .any(|loc| loc.actors.contains(&actor.id));
            if elsewhere {
                return Err(format!("{} listed in two locations", actor.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
