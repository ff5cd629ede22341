//! Action execution: precondition re-checks, state mutation, and the result record.

use contracts::{
    Action, ActorId, ExecutionResult, FailureReason, ItemId, ItemTag, LocationId, NeedKind,
    Target,
};
use log::debug;
use rand::seq::IteratorRandom;
use rand::Rng;

use crate::actor::Actor;
use crate::entity::{EntityStore, Owner};
use crate::perception::{list_to_natural, with_articles};
use crate::spatial::{WorldGraph, DOOR_CLOSED_REASON};

/// Mutable borrow of everything an action can touch.
pub struct ExecutionContext<'a, R: Rng + ?Sized> {
    pub graph: &'a mut WorldGraph,
    pub entities: &'a mut EntityStore,
    pub actors: &'a mut [Actor],
    pub rng: &'a mut R,
}

struct Outcome {
    targets: Vec<Target>,
    locations: Vec<LocationId>,
    extra_text: String,
}

impl Outcome {
    fn at(location: LocationId, targets: Vec<Target>) -> Self {
        Self {
            targets,
            locations: vec![location],
            extra_text: String::new(),
        }
    }

    fn with_text(mut self, text: impl Into<String>) -> Self {
        self.extra_text = text.into();
        self
    }
}

impl<R: Rng + ?Sized> ExecutionContext<'_, R> {
    /// Run `action` for `actor` at simulated time `now`.
    ///
    /// Eligibility advances by the verb's duration whether or not the action succeeds, and
    /// a matching itinerary head is consumed either way.
    pub fn execute(&mut self, actor: ActorId, action: Action, now: f64) -> ExecutionResult {
        let Some(state) = self.actors.get_mut(actor.index()) else {
            return ExecutionResult {
                actor,
                action,
                targets: Vec::new(),
                locations: Vec::new(),
                success: false,
                failure: Some(FailureReason::TargetAbsent),
                extra_text: String::new(),
                time: now,
            };
        };
        let origin = state.location;
        let duration = state.duration_of(action.verb().base_duration());
        state.defer_until(now + duration);
        state.itinerary.satisfy(&action);

        let outcome = self.apply(actor, origin, action);
        let result = match outcome {
            Ok(outcome) => ExecutionResult {
                actor,
                action,
                targets: outcome.targets,
                locations: outcome.locations,
                success: true,
                failure: None,
                extra_text: outcome.extra_text,
                time: now,
            },
            Err(reason) => ExecutionResult {
                actor,
                action,
                targets: targets_of(&action),
                locations: vec![origin],
                success: false,
                failure: Some(reason),
                extra_text: String::new(),
                time: now,
            },
        };
        debug!(
            "{actor} {} at {now:.2}: success={} {:?}",
            action.verb(),
            result.success,
            result.failure
        );
        result
    }

    fn apply(
        &mut self,
        actor: ActorId,
        here: LocationId,
        action: Action,
    ) -> Result<Outcome, FailureReason> {
        match action {
            Action::Move { destination } => self.move_to(actor, here, destination),
            Action::Take { item } => self.take(actor, here, item),
            Action::Drop { item } => {
                self.require_carried(actor, item)?;
                self.entities.transfer(item, Owner::Location(here));
                Ok(Outcome::at(here, vec![Target::Item(item)]))
            }
            Action::Eat { item } => self.consume(actor, here, item, NeedKind::Eat),
            Action::Drink { item } => self.consume(actor, here, item, NeedKind::Drink),
            Action::Rest { item } => self.consume(actor, here, item, NeedKind::Rest),
            Action::Open { item } => self.set_open(actor, here, item, true),
            Action::Close { item } => self.set_open(actor, here, item, false),
            Action::Lock { item, key } => self.set_locked(actor, here, item, key, true),
            Action::Unlock { item, key } => self.set_locked(actor, here, item, key, false),
            Action::Withdraw { item, container } => self.withdraw(actor, here, item, container),
            Action::Talk { target } => self.talk(actor, here, target),
            Action::Rob { target } => self.rob(actor, here, target),
            Action::Look => Ok(Outcome::at(here, vec![Target::Location(here)])
                .with_text(self.describe_location(actor, here))),
            Action::Inventory => {
                let names = self.item_names(self.entities.inventory(actor));
                let text = if names.is_empty() {
                    "nothing".to_string()
                } else {
                    list_to_natural(&with_articles(&names))
                };
                Ok(Outcome::at(here, Vec::new()).with_text(text))
            }
            Action::Wait => Ok(Outcome::at(here, Vec::new())),
        }
    }

    // --- movement ---

    fn move_to(
        &mut self,
        actor: ActorId,
        here: LocationId,
        destination: LocationId,
    ) -> Result<Outcome, FailureReason> {
        let connection = self
            .graph
            .connection_between(here, destination)
            .and_then(|id| self.graph.connection(id))
            .ok_or(FailureReason::NoConnection)?;
        if let Some(reason) = connection.blocked_reason() {
            return Err(FailureReason::Blocked {
                reason: reason.to_string(),
            });
        }
        self.graph
            .place_actor(destination, actor)
            .map_err(|_| FailureReason::NoConnection)?;
        self.graph.remove_actor(here, actor);
        if let Some(state) = self.actors.get_mut(actor.index()) {
            state.location = destination;
        }
        Ok(Outcome {
            targets: vec![Target::Location(destination)],
            locations: vec![here, destination],
            extra_text: String::new(),
        })
    }

    // --- items ---

    fn take(
        &mut self,
        actor: ActorId,
        here: LocationId,
        item: ItemId,
    ) -> Result<Outcome, FailureReason> {
        if self.entities.owner(item) != Some(Owner::Location(here)) {
            return Err(FailureReason::NotPresent);
        }
        self.require_tag(item, ItemTag::Take)?;
        self.require_room(actor)?;
        self.entities.transfer(item, Owner::Actor(actor));
        self.acquired(actor, item);
        Ok(Outcome::at(here, vec![Target::Item(item)]))
    }

    fn consume(
        &mut self,
        actor: ActorId,
        here: LocationId,
        item: ItemId,
        need: NeedKind,
    ) -> Result<Outcome, FailureReason> {
        match self.entities.owner(item) {
            Some(Owner::Actor(owner)) if owner == actor => {}
            Some(Owner::Location(location)) if location == here => {
                if self.entities.has_tag(item, ItemTag::TakeReq) {
                    return Err(FailureReason::MustTakeFirst);
                }
            }
            _ => return Err(FailureReason::NotPresent),
        }
        self.require_tag(item, need.satisfier())?;

        let value = self.entities.item(item).map(|i| i.value).unwrap_or(0.0);
        if let Some(state) = self.actors.get_mut(actor.index()) {
            state.needs.relieve(need, value);
        }
        if !self.entities.has_tag(item, ItemTag::Permanent) {
            self.entities.destroy(item);
        }
        Ok(Outcome::at(here, vec![Target::Item(item)]))
    }

    fn withdraw(
        &mut self,
        actor: ActorId,
        here: LocationId,
        item: ItemId,
        container: ItemId,
    ) -> Result<Outcome, FailureReason> {
        self.require_reachable(actor, here, container)?;
        self.require_tag(container, ItemTag::Container)?;
        if self
            .entities
            .item(container)
            .is_some_and(|c| c.is_closed())
        {
            return Err(FailureReason::ContainerClosed);
        }
        if self.entities.owner(item) != Some(Owner::Container(container)) {
            return Err(FailureReason::NotPresent);
        }
        self.require_room(actor)?;
        self.entities.transfer(item, Owner::Actor(actor));
        self.acquired(actor, item);
        Ok(Outcome::at(
            here,
            vec![Target::Item(item), Target::Item(container)],
        ))
    }

    // --- latches ---

    fn set_open(
        &mut self,
        actor: ActorId,
        here: LocationId,
        item: ItemId,
        open: bool,
    ) -> Result<Outcome, FailureReason> {
        self.require_reachable(actor, here, item)?;
        self.require_tag(item, ItemTag::Openable)?;
        let door = self.entities.item(item).and_then(|i| i.door);
        let latch = self
            .entities
            .latch_mut(item)
            .ok_or(FailureReason::MissingTag {
                tag: ItemTag::Openable,
            })?;
        match (open, latch.closed) {
            (true, false) => return Err(FailureReason::AlreadyOpen),
            (false, true) => return Err(FailureReason::AlreadyClosed),
            (true, true) if latch.locked => return Err(FailureReason::Locked),
            _ => latch.closed = !open,
        }
        if let Some(connection) = door.and_then(|id| self.graph.connection_mut(id)) {
            if open {
                connection.open();
            } else {
                connection.close(DOOR_CLOSED_REASON);
            }
        }
        Ok(Outcome::at(here, vec![Target::Item(item)]))
    }

    fn set_locked(
        &mut self,
        actor: ActorId,
        here: LocationId,
        item: ItemId,
        key: ItemId,
        lock: bool,
    ) -> Result<Outcome, FailureReason> {
        self.require_reachable(actor, here, item)?;
        self.require_carried(actor, key)?;
        let picks = self.entities.has_tag(item, ItemTag::Pickable)
            && self.entities.has_tag(key, ItemTag::Pick);
        let latch = self
            .entities
            .latch_mut(item)
            .filter(|latch| latch.lockable)
            .ok_or(FailureReason::NotLockable)?;
        if latch.key != Some(key) && !picks {
            return Err(FailureReason::WrongKey);
        }
        match (lock, latch.locked) {
            (true, true) => return Err(FailureReason::Locked),
            (false, false) => return Err(FailureReason::NotLocked),
            (true, false) if !latch.closed => return Err(FailureReason::OpenLock),
            _ => latch.locked = lock,
        }
        Ok(Outcome::at(here, vec![Target::Item(item), Target::Item(key)]))
    }

    // --- other actors ---

    fn talk(
        &mut self,
        actor: ActorId,
        here: LocationId,
        target: ActorId,
    ) -> Result<Outcome, FailureReason> {
        self.require_near(here, target)?;
        let speaker = &self.actors[actor.index()];
        let line = speaker
            .sounds
            .iter()
            .choose(&mut *self.rng)
            .cloned()
            .unwrap_or_else(|| "hello".to_string());
        Ok(Outcome::at(here, vec![Target::Actor(target)]).with_text(line))
    }

    fn rob(
        &mut self,
        actor: ActorId,
        here: LocationId,
        target: ActorId,
    ) -> Result<Outcome, FailureReason> {
        self.require_near(here, target)?;
        let loot = self
            .entities
            .first_tagged(self.entities.inventory(target), ItemTag::Valuable)
            .ok_or(FailureReason::NothingToRob)?;
        self.require_room(actor)?;
        self.entities.transfer(loot, Owner::Actor(actor));
        self.acquired(actor, loot);
        Ok(Outcome::at(
            here,
            vec![Target::Actor(target), Target::Item(loot)],
        ))
    }

    // --- checks ---

    fn require_tag(&self, item: ItemId, tag: ItemTag) -> Result<(), FailureReason> {
        if self.entities.has_tag(item, tag) {
            Ok(())
        } else {
            Err(FailureReason::MissingTag { tag })
        }
    }

    fn require_carried(&self, actor: ActorId, item: ItemId) -> Result<(), FailureReason> {
        if self.entities.owner(item) == Some(Owner::Actor(actor)) {
            Ok(())
        } else {
            Err(FailureReason::NotInInventory)
        }
    }

    fn require_reachable(
        &self,
        actor: ActorId,
        here: LocationId,
        item: ItemId,
    ) -> Result<(), FailureReason> {
        match self.entities.owner(item) {
            Some(Owner::Location(location)) if location == here => Ok(()),
            Some(Owner::Actor(owner)) if owner == actor => Ok(()),
            _ if self.door_touches(item, here) => Ok(()),
            _ => Err(FailureReason::NotPresent),
        }
    }

    /// Doors can be worked from either side of their connection.
    fn door_touches(&self, item: ItemId, here: LocationId) -> bool {
        self.entities
            .item(item)
            .and_then(|i| i.door)
            .and_then(|id| self.graph.connection(id))
            .is_some_and(|c| c.a == here || c.b == here)
    }

    fn require_room(&self, actor: ActorId) -> Result<(), FailureReason> {
        let capacity = self
            .actors
            .get(actor.index())
            .map(|a| a.inventory_capacity)
            .unwrap_or(0);
        if self.entities.inventory(actor).len() < capacity {
            Ok(())
        } else {
            Err(FailureReason::InventoryFull)
        }
    }

    fn require_near(&self, here: LocationId, target: ActorId) -> Result<(), FailureReason> {
        match self.actors.get(target.index()) {
            Some(other) if other.location == here => Ok(()),
            _ => Err(FailureReason::TargetAbsent),
        }
    }

    /// Greed is relieved by acquiring valuables.
    fn acquired(&mut self, actor: ActorId, item: ItemId) {
        let Some(found) = self.entities.item(item) else {
            return;
        };
        if !found.has_tag(ItemTag::Valuable) {
            return;
        }
        let value = found.value;
        if let Some(state) = self.actors.get_mut(actor.index()) {
            state.needs.relieve(NeedKind::Greed, value);
        }
    }

    // --- descriptions ---

    fn item_names(&self, ids: &[ItemId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.entities.item(*id))
            .map(|item| item.name.clone())
            .collect()
    }

    fn describe_location(&self, viewer: ActorId, here: LocationId) -> String {
        let Some(location) = self.graph.location(here) else {
            return String::new();
        };
        let mut text = location.description.clone();

        let items = self.item_names(self.entities.items_at(here));
        if !items.is_empty() {
            text.push_str(&format!(
                " There is {} here.",
                list_to_natural(&with_articles(&items))
            ));
        }

        let others = location
            .actors
            .iter()
            .filter(|id| **id != viewer)
            .filter_map(|id| self.actors.get(id.index()))
            .map(Actor::display_name)
            .collect::<Vec<_>>();
        if !others.is_empty() {
            text.push_str(&format!(" I see {}.", list_to_natural(&others)));
        }

        let exits = location
            .connections
            .iter()
            .filter_map(|id| self.graph.connection(*id))
            .filter_map(|c| c.direction_from(here).map(str::to_string))
            .collect::<Vec<_>>();
        if !exits.is_empty() {
            text.push_str(&format!(" Exits lead {}.", list_to_natural(&exits)));
        }
        text.trim().to_string()
    }
}

fn targets_of(action: &Action) -> Vec<Target> {
    match *action {
        Action::Move { destination } => vec![Target::Location(destination)],
        Action::Take { item }
        | Action::Drop { item }
        | Action::Eat { item }
        | Action::Drink { item }
        | Action::Rest { item }
        | Action::Open { item }
        | Action::Close { item } => vec![Target::Item(item)],
        Action::Lock { item, key } | Action::Unlock { item, key } => {
            vec![Target::Item(item), Target::Item(key)]
        }
        Action::Withdraw { item, container } => vec![Target::Item(item), Target::Item(container)],
        Action::Talk { target } | Action::Rob { target } => vec![Target::Actor(target)],
        Action::Look | Action::Inventory | Action::Wait => Vec::new(),
    }
}
