use contracts::{ItemId, ItemTag, LocationId, Verb};

use crate::entity::Owner;

use super::*;

/// Why a `(verb, object)` request from the player could not become an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("I don't know how to \"{0}\".")]
    UnknownVerb(String),
    #[error("What do I want to {0}?")]
    MissingObject(Verb),
    #[error("I don't see any \"{0}\" here.")]
    UnknownObject(String),
    #[error("I can't go \"{0}\" from here.")]
    NoExit(String),
    #[error("I have nothing to {verb} the {object} with.")]
    NoKey { verb: Verb, object: String },
}

/// Expand one-letter direction shortcuts.
pub fn expand_direction(word: &str) -> &str {
    match word {
        "n" => "north",
        "s" => "south",
        "e" => "east",
        "w" => "west",
        "u" => "up",
        "d" => "down",
        other => other,
    }
}

fn parse_verb(word: &str) -> Option<Verb> {
    let verb = match word {
        "go" | "move" | "walk" => Verb::Move,
        "take" | "get" | "pick" => Verb::Take,
        "drop" => Verb::Drop,
        "eat" => Verb::Eat,
        "drink" => Verb::Drink,
        "rest" | "sleep" | "lie" => Verb::Rest,
        "open" => Verb::Open,
        "close" | "shut" => Verb::Close,
        "lock" => Verb::Lock,
        "unlock" => Verb::Unlock,
        "withdraw" => Verb::Withdraw,
        "talk" | "say" => Verb::Talk,
        "rob" | "mug" => Verb::Rob,
        "look" | "l" => Verb::Look,
        "inventory" | "inv" | "i" => Verb::Inventory,
        "wait" | "z" => Verb::Wait,
        _ => return None,
    };
    Some(verb)
}

impl World {
    /// Queue `action` for the player's next eligible pass, replacing anything queued.
    pub fn submit_player_action(&mut self, action: Action) {
        self.player_action = action;
    }

    /// Resolve and queue a request. Nothing is queued on error.
    pub fn submit_command(
        &mut self,
        verb: &str,
        object: Option<&str>,
    ) -> Result<Action, CommandError> {
        let action = self.resolve_command(verb, object)?;
        self.submit_player_action(action);
        Ok(action)
    }

    /// Turn `(verb, object-name)` into a concrete action, resolving names against the
    /// player's surroundings and inventory.
    pub fn resolve_command(
        &self,
        verb: &str,
        object: Option<&str>,
    ) -> Result<Action, CommandError> {
        let verb_word = verb.trim().to_lowercase();
        let object = object
            .map(|o| o.trim().to_lowercase())
            .filter(|o| !o.is_empty());

        // A bare direction is a move.
        if object.is_none() && self.exit_toward(expand_direction(&verb_word)).is_some() {
            return self.resolve_move(&verb_word);
        }

        let verb =
            parse_verb(&verb_word).ok_or_else(|| CommandError::UnknownVerb(verb_word.clone()))?;
        match verb {
            Verb::Look => return Ok(Action::Look),
            Verb::Inventory => return Ok(Action::Inventory),
            Verb::Wait => return Ok(Action::Wait),
            _ => {}
        }
        let object = object.ok_or(CommandError::MissingObject(verb))?;

        match verb {
            Verb::Move => self.resolve_move(&object),
            Verb::Talk | Verb::Rob => {
                let target = self
                    .nearby_actor(&object)
                    .ok_or_else(|| CommandError::UnknownObject(object.clone()))?;
                Ok(if verb == Verb::Talk {
                    Action::Talk { target }
                } else {
                    Action::Rob { target }
                })
            }
            Verb::Take | Verb::Withdraw => {
                if let Some((item, container)) = self.contained_item(&object) {
                    return Ok(Action::Withdraw { item, container });
                }
                let item = self.visible_item(&object)?;
                Ok(Action::Take { item })
            }
            Verb::Lock | Verb::Unlock => {
                let item = self.visible_item(&object)?;
                let key = self
                    .key_for(item)
                    .ok_or_else(|| CommandError::NoKey { verb, object })?;
                Ok(if verb == Verb::Lock {
                    Action::Lock { item, key }
                } else {
                    Action::Unlock { item, key }
                })
            }
            _ => {
                let item = self.visible_item(&object)?;
                Ok(match verb {
                    Verb::Drop => Action::Drop { item },
                    Verb::Eat => Action::Eat { item },
                    Verb::Drink => Action::Drink { item },
                    Verb::Rest => Action::Rest { item },
                    Verb::Open => Action::Open { item },
                    _ => Action::Close { item },
                })
            }
        }
    }

    fn player_location(&self) -> LocationId {
        self.player_actor()
            .map(|a| a.location)
            .unwrap_or(LocationId(0))
    }

    fn exit_toward(&self, word: &str) -> Option<LocationId> {
        let here = self.player_location();
        let location = self.graph.location(here)?;
        location
            .connections
            .iter()
            .filter_map(|id| self.graph.connection(*id))
            .find_map(|connection| {
                let other = connection.other(here)?;
                let direction = connection.direction_from(here)?;
                let name = self.graph.location(other).map(|l| l.name.to_lowercase())?;
                let matches = direction.eq_ignore_ascii_case(word)
                    || name == word
                    || name.strip_prefix("the ") == Some(word);
                matches.then_some(other)
            })
    }

    fn resolve_move(&self, object: &str) -> Result<Action, CommandError> {
        let word = expand_direction(object);
        self.exit_toward(word)
            .map(|destination| Action::Move { destination })
            .ok_or_else(|| CommandError::NoExit(word.to_string()))
    }

    fn nearby_actor(&self, name: &str) -> Option<ActorId> {
        let here = self.graph.location(self.player_location())?;
        here.actors
            .iter()
            .filter(|id| **id != self.player)
            .filter_map(|id| self.actor(*id))
            .find(|actor| {
                actor.proper_name.eq_ignore_ascii_case(name)
                    || actor.common_name.eq_ignore_ascii_case(name)
            })
            .map(|actor| actor.id)
    }

    /// Items the player can refer to: inventory first, then the floor, then doors on exits.
    fn visible_item(&self, name: &str) -> Result<ItemId, CommandError> {
        let here = self.player_location();
        let mut candidates = self.entities.inventory(self.player).to_vec();
        candidates.extend_from_slice(self.entities.items_at(here));
        candidates.extend(self.entities.items().iter().filter_map(|item| {
            let connection = self.graph.connection(item.door?)?;
            let touches = connection.a == here || connection.b == here;
            (touches && !self.entities.items_at(here).contains(&item.id))
                .then_some(item.id)
        }));
        self.match_name(&candidates, name)
            .ok_or_else(|| CommandError::UnknownObject(name.to_string()))
    }

    /// An item inside an open container on the floor here.
    fn contained_item(&self, name: &str) -> Option<(ItemId, ItemId)> {
        let here = self.player_location();
        self.entities
            .items_at(here)
            .iter()
            .copied()
            .filter(|id| self.entities.has_tag(*id, ItemTag::Container))
            .filter(|id| self.entities.item(*id).is_some_and(|c| !c.is_closed()))
            .find_map(|container| {
                self.match_name(self.entities.contents(container), name)
                    .map(|item| (item, container))
            })
    }

    /// Exact name match first, then a match on any word of the name.
    fn match_name(&self, ids: &[ItemId], name: &str) -> Option<ItemId> {
        let named = |id: &&ItemId| {
            self.entities
                .item(**id)
                .is_some_and(|item| item.name.eq_ignore_ascii_case(name))
        };
        let partial = |id: &&ItemId| {
            self.entities.item(**id).is_some_and(|item| {
                item.name
                    .split_whitespace()
                    .any(|word| word.eq_ignore_ascii_case(name))
            })
        };
        ids.iter()
            .find(named)
            .or_else(|| ids.iter().find(partial))
            .copied()
    }

    /// A carried key that fits `item`, or a pick for a pickable lock.
    fn key_for(&self, item: ItemId) -> Option<ItemId> {
        let carried = self.entities.inventory(self.player);
        let latch_key = self
            .entities
            .item(item)
            .and_then(|i| i.latch.as_ref())
            .and_then(|latch| latch.key)
            .filter(|key| self.entities.owner(*key) == Some(Owner::Actor(self.player)));
        latch_key.or_else(|| {
            self.entities
                .has_tag(item, ItemTag::Pickable)
                .then(|| self.entities.first_tagged(carried, ItemTag::Pick))
                .flatten()
        })
    }
}
