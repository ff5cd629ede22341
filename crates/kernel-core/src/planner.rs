//! Need-driven plan construction.
//!
//! A plan is every candidate action an actor could take right now, sorted by
//! priority (highest first). Only the head is executed; the rest is discarded.

use contracts::{
    Action, ActorId, CompositePlan, Condition, ItemId, ItemTag, LocationId, PlanEntry, PlanSource,
    Requirement, Strategy,
};
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::actor::Actor;
use crate::entity::{EntityStore, Owner};
use crate::needs::Need;
use crate::spatial::WorldGraph;

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// `K` in the itinerary urgency `K / (trigger - now + 1)`.
    pub itinerary_urgency: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            itinerary_urgency: 1000.0,
        }
    }
}

/// Read-only slice of the world a planning actor can see.
#[derive(Debug, Clone, Copy)]
pub struct PlanningView<'a> {
    pub graph: &'a WorldGraph,
    pub entities: &'a EntityStore,
    pub actors: &'a [Actor],
    pub now: f64,
}

impl PlanningView<'_> {
    fn actor_location(&self, actor: ActorId) -> Option<LocationId> {
        self.actors.get(actor.index()).map(|a| a.location)
    }

    /// First hop from `from` toward `to`, ignoring blocked connections.
    fn first_hop(&self, from: LocationId, to: LocationId) -> Option<LocationId> {
        let path = self.graph.find_path(&[from], &[to], false)?;
        path.get(1).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NeedPlanner;

impl NeedPlanner {
    /// Build the sorted candidate list for `actor`. Never empty.
    pub fn plan<R: Rng + ?Sized>(
        actor: &Actor,
        view: &PlanningView<'_>,
        config: &PlannerConfig,
        rng: &mut R,
    ) -> Vec<PlanEntry> {
        let mut plan = Vec::new();
        let mut roamed = false;

        for need in actor.needs.iter() {
            match &need.strategy {
                Strategy::Search { roam } => {
                    if let Some(entry) = search_candidate(actor, need, view) {
                        plan.push(entry);
                    } else if *roam && !roamed {
                        if let Some(destination) = roam_destination(actor.location, view.graph, rng)
                        {
                            plan.push(PlanEntry::new(
                                Action::Move { destination },
                                need.intensity,
                                PlanSource::Need(need.kind),
                            ));
                            roamed = true;
                        }
                    }
                }
                Strategy::Composite(composite) => {
                    if let Some(entry) = composite_candidate(actor, need, composite, view) {
                        plan.push(entry);
                    }
                }
                Strategy::Scheduled => {}
            }
        }

        plan.push(PlanEntry::new(Action::Wait, actor.laziness, PlanSource::Idle));

        if actor.capabilities.follows_itinerary {
            if let Some(entry) = itinerary_candidate(actor, view, config) {
                plan.push(entry);
            }
        }

        // Stable: equal priorities keep insertion order.
        plan.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        plan
    }
}

/// Urgency of an itinerary entry; peaks at `k` once the trigger time arrives.
pub fn itinerary_priority(k: f64, trigger_time: f64, now: f64) -> f64 {
    k / ((trigger_time - now).max(0.0) + 1.0)
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

fn search_candidate(actor: &Actor, need: &Need, view: &PlanningView<'_>) -> Option<PlanEntry> {
    let tag = need.kind.satisfier();
    let entities = view.entities;
    let source = PlanSource::Need(need.kind);

    if let Some(consume) = entities
        .first_tagged(entities.inventory(actor.id), tag)
        .and_then(|item| need.kind.consume(item))
    {
        return Some(PlanEntry::new(consume, need.intensity, source));
    }

    // Skip items that can neither be used in place nor picked up.
    let action = entities
        .items_at(actor.location)
        .iter()
        .copied()
        .filter(|item| entities.has_tag(*item, tag))
        .find_map(|item| match need.kind.consume(item) {
            Some(consume) if !entities.has_tag(item, ItemTag::TakeReq) => Some(consume),
            _ if entities.has_tag(item, ItemTag::Take) => Some(Action::Take { item }),
            _ => None,
        })?;
    Some(PlanEntry::new(action, need.intensity, source))
}

fn roam_destination<R: Rng + ?Sized>(
    location: LocationId,
    graph: &WorldGraph,
    rng: &mut R,
) -> Option<LocationId> {
    let exit = graph.open_exits(location).into_iter().choose(rng)?;
    graph.connection(exit)?.other(location)
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

fn composite_candidate(
    actor: &Actor,
    need: &Need,
    composite: &CompositePlan,
    view: &PlanningView<'_>,
) -> Option<PlanEntry> {
    let priority = need.intensity;
    let source = PlanSource::Composite(need.kind);
    let blocking = composite
        .conditions
        .iter()
        .filter(|condition| !condition_met(actor, condition, view))
        .find(|condition| condition.priority >= priority);

    match blocking {
        None => Some(PlanEntry::new(composite.action, priority, source)),
        Some(condition) => prerequisite_step(actor, condition.requirement, view)
            .map(|step| PlanEntry::new(step, priority, source)),
    }
}

fn condition_met(actor: &Actor, condition: &Condition, view: &PlanningView<'_>) -> bool {
    let carried = view.entities.inventory(actor.id);
    match condition.requirement {
        Requirement::Have(tag) => view.entities.first_tagged(carried, tag).is_some(),
        Requirement::Hold(item) => carried.contains(&item),
        Requirement::At(location) => actor.location == location,
        Requirement::Near(other) => view.actor_location(other) == Some(actor.location),
    }
}

/// One concrete action that makes progress toward an unmet requirement, if any.
fn prerequisite_step(
    actor: &Actor,
    requirement: Requirement,
    view: &PlanningView<'_>,
) -> Option<Action> {
    let takeable_here = |item: ItemId| {
        view.entities.owner(item) == Some(Owner::Location(actor.location))
            && view.entities.has_tag(item, ItemTag::Take)
    };
    match requirement {
        Requirement::Have(tag) => view
            .entities
            .items_at(actor.location)
            .iter()
            .copied()
            .find(|item| view.entities.has_tag(*item, tag) && takeable_here(*item))
            .map(|item| Action::Take { item }),
        Requirement::Hold(item) => takeable_here(item).then_some(Action::Take { item }),
        Requirement::At(location) => view
            .first_hop(actor.location, location)
            .map(|destination| Action::Move { destination }),
        Requirement::Near(other) => view
            .actor_location(other)
            .and_then(|target| view.first_hop(actor.location, target))
            .map(|destination| Action::Move { destination }),
    }
}

// ---------------------------------------------------------------------------
// Itinerary
// ---------------------------------------------------------------------------

fn itinerary_candidate(
    actor: &Actor,
    view: &PlanningView<'_>,
    config: &PlannerConfig,
) -> Option<PlanEntry> {
    let head = actor.itinerary.head()?;
    let priority = itinerary_priority(config.itinerary_urgency, head.trigger_time, view.now);
    let action = match head.action {
        Action::Move { destination }
            if destination != actor.location
                && view
                    .graph
                    .connection_between(actor.location, destination)
                    .is_none() =>
        {
            match view.first_hop(actor.location, destination) {
                Some(hop) => Action::Move { destination: hop },
                None => head.action,
            }
        }
        action => action,
    };
    Some(PlanEntry::new(action, priority, PlanSource::Itinerary))
}
