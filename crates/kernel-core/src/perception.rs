//! Event reporting: which execution results the player can perceive, and how they read.
//!
//! Reach is one hop. An event is perceivable from its own locations and from any location
//! joined to one of them by a connection carrying the configured cue.

use std::collections::BTreeSet;

use contracts::{
    Action, ActorId, Cue, ExecutionResult, ItemId, LocationId, SimConfig, Target, Verb,
};

use crate::actor::Actor;
use crate::entity::EntityStore;
use crate::spatial::WorldGraph;

/// Read-only world state needed to name things.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub graph: &'a WorldGraph,
    pub entities: &'a EntityStore,
    pub actors: &'a [Actor],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reporter {
    /// Report everything, `wait` included, in debug form.
    pub verbose: bool,
    pub cue: Cue,
}

impl Reporter {
    pub fn new(verbose: bool, cue: Cue) -> Self {
        Self { verbose, cue }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.verbose, config.cue)
    }

    /// Render every result `player` can perceive, in order.
    pub fn report(
        &self,
        scene: &Scene<'_>,
        player: ActorId,
        results: &[ExecutionResult],
    ) -> Vec<String> {
        if self.verbose {
            return results.iter().map(|r| format!("{r:?}")).collect();
        }
        let Some(at) = scene.actors.get(player.index()).map(|a| a.location) else {
            return Vec::new();
        };
        results
            .iter()
            .filter(|result| result.verb() != Verb::Wait)
            .filter_map(|result| {
                let sense = self.sense(scene.graph, result, at)?;
                Some(render(scene, player, result, sense))
            })
            .collect()
    }

    /// Whether a player standing at `at` would notice `result`.
    pub fn is_perceivable(
        &self,
        graph: &WorldGraph,
        result: &ExecutionResult,
        at: LocationId,
    ) -> bool {
        self.verbose || self.sense(graph, result, at).is_some()
    }

    fn sense(&self, graph: &WorldGraph, result: &ExecutionResult, at: LocationId) -> Option<Sense> {
        if result.locations.contains(&at) {
            return Some(Sense::Present);
        }
        let mut reach: BTreeSet<LocationId> = graph.perceivable_from(&result.locations, self.cue);
        if result.verb() == Verb::Talk {
            reach.extend(graph.perceivable_from(&result.locations, Cue::Audible));
        }
        if !reach.contains(&at) {
            return None;
        }
        let seen = self.cue == Cue::Visible
            && graph.perceivable_from(&result.locations, Cue::Visible).contains(&at);
        Some(if seen { Sense::Sight } else { Sense::Hearing })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sense {
    Present,
    Sight,
    Hearing,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(scene: &Scene<'_>, player: ActorId, result: &ExecutionResult, sense: Sense) -> String {
    let first_person = result.actor == player;
    if first_person && result.success {
        match result.action {
            Action::Look => return result.extra_text.clone(),
            Action::Inventory => return format!("I am carrying {}.", result.extra_text),
            _ => {}
        }
    }

    if sense == Sense::Hearing && !first_person {
        return match result.action {
            Action::Talk { .. } => format!("I hear someone say \"{}\" nearby.", result.extra_text),
            _ => format!("I hear someone {} nearby.", gerund(result.verb())),
        };
    }

    let subject = if first_person {
        "I".to_string()
    } else {
        capitalize(&actor_name(scene, player, result.actor))
    };
    let (base, third) = verb_forms(result.verb());
    let object = object_phrase(scene, player, result);

    if !result.success {
        let reason = result
            .failure
            .as_ref()
            .map(|f| clause(&f.to_string()))
            .unwrap_or_else(|| "it does not work".to_string());
        let tries = if first_person { "try" } else { "tries" };
        return format!("{subject} {tries} to {base}{object}, but {reason}.");
    }

    let verb = if first_person { base } else { third };
    match result.action {
        Action::Talk { .. } => format!("{subject} {verb} \"{}\"{object}.", result.extra_text),
        _ => format!("{subject} {verb}{object}."),
    }
}

fn verb_forms(verb: Verb) -> (&'static str, &'static str) {
    match verb {
        Verb::Move => ("move", "moves"),
        Verb::Take => ("pick up", "picks up"),
        Verb::Drop => ("drop", "drops"),
        Verb::Eat => ("eat", "eats"),
        Verb::Drink => ("drink", "drinks"),
        Verb::Rest => ("rest on", "rests on"),
        Verb::Open => ("open", "opens"),
        Verb::Close => ("close", "closes"),
        Verb::Lock => ("lock", "locks"),
        Verb::Unlock => ("unlock", "unlocks"),
        Verb::Withdraw => ("take", "takes"),
        Verb::Talk => ("say", "says"),
        Verb::Rob => ("rob", "robs"),
        Verb::Look => ("look around", "looks around"),
        Verb::Inventory => ("check my pockets", "checks their pockets"),
        Verb::Wait => ("wait", "waits"),
    }
}

fn gerund(verb: Verb) -> &'static str {
    match verb {
        Verb::Move => "moving",
        Verb::Open => "opening something",
        Verb::Close => "closing something",
        Verb::Lock | Verb::Unlock => "fiddling with a lock",
        Verb::Rob => "struggling",
        Verb::Eat => "eating",
        Verb::Drink => "drinking",
        _ => "doing something",
    }
}

/// Everything after the verb: " north to the park", " the knife", " the coin out of the chest".
fn object_phrase(scene: &Scene<'_>, player: ActorId, result: &ExecutionResult) -> String {
    let item = |id: ItemId| item_name(scene.entities, id);
    match result.action {
        Action::Move { destination } => {
            let place = location_name(scene.graph, destination);
            let direction = result
                .locations
                .first()
                .and_then(|origin| {
                    let id = scene.graph.connection_between(*origin, destination)?;
                    scene.graph.connection(id)?.direction_from(*origin)
                })
                .map(|d| format!(" {d}"))
                .unwrap_or_default();
            format!("{direction} to {place}")
        }
        Action::Take { item: id }
        | Action::Drop { item: id }
        | Action::Eat { item: id }
        | Action::Drink { item: id }
        | Action::Rest { item: id }
        | Action::Open { item: id }
        | Action::Close { item: id } => format!(" {}", item(id)),
        Action::Lock { item: id, key } | Action::Unlock { item: id, key } => {
            format!(" {} with {}", item(id), item(key))
        }
        Action::Withdraw { item: id, container } => {
            format!(" {} out of {}", item(id), item(container))
        }
        Action::Talk { target } => format!(" to {}", actor_name(scene, player, target)),
        Action::Rob { target } => {
            let loot = result.targets.iter().find_map(|t| match t {
                Target::Item(id) => Some(*id),
                _ => None,
            });
            match loot {
                Some(id) if result.success => {
                    format!(" {} of {}", actor_name(scene, player, target), item(id))
                }
                _ => format!(" {}", actor_name(scene, player, target)),
            }
        }
        Action::Look | Action::Inventory | Action::Wait => String::new(),
    }
}

fn actor_name(scene: &Scene<'_>, player: ActorId, actor: ActorId) -> String {
    if actor == player {
        return "me".to_string();
    }
    scene
        .actors
        .get(actor.index())
        .map(Actor::display_name)
        .unwrap_or_else(|| "someone".to_string())
}

fn item_name(entities: &EntityStore, item: ItemId) -> String {
    entities
        .item(item)
        .map(|i| format!("the {}", i.name))
        .unwrap_or_else(|| "something".to_string())
}

fn location_name(graph: &WorldGraph, location: LocationId) -> String {
    graph
        .location(location)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| "somewhere".to_string())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a sentence into a trailing clause: "The door is closed." -> "the door is closed".
fn clause(sentence: &str) -> String {
    let trimmed = sentence.trim().trim_end_matches('.');
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// "a", "a and b", "a, b and c".
pub fn list_to_natural(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Group duplicate names in first-seen order: `["pie", "bed", "pie"]` -> `["2 pies", "a bed"]`.
pub fn with_articles(names: &[String]) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for name in names {
        match counts.iter_mut().find(|(seen, _)| *seen == name.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.as_str(), 1)),
        }
    }
    counts
        .into_iter()
        .map(|(name, count)| match count {
            1 => format!("{} {name}", indefinite_article(name)),
            n => format!("{n} {name}s"),
        })
        .collect()
}

fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ItemSpec, Owner};
    use contracts::FailureReason;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn natural_lists() {
        assert_eq!(list_to_natural(&[]), "");
        assert_eq!(list_to_natural(&strings(&["a bed"])), "a bed");
        assert_eq!(list_to_natural(&strings(&["x", "y"])), "x and y");
        assert_eq!(
            list_to_natural(&with_articles(&strings(&[
                "cat food", "bed", "cat food", "sink"
            ]))),
            "2 cat foods, a bed and a sink"
        );
        assert_eq!(with_articles(&strings(&["apple"])), strings(&["an apple"]));
    }

    struct Town {
        graph: WorldGraph,
        entities: EntityStore,
        actors: Vec<Actor>,
        park: LocationId,
        alley: LocationId,
        home: LocationId,
    }

    /// home --(not visible, audible)-- park --(visible)-- alley
    fn town() -> Town {
        let mut graph = WorldGraph::new();
        let home = graph.add_location("the home", "", Vec::new());
        let park = graph.add_location("the park", "", Vec::new());
        let alley = graph.add_location("the alley", "", Vec::new());
        graph.connect(home, park, "north", "south", false, true).unwrap();
        graph.connect(park, alley, "west", "east", true, false).unwrap();

        let mut player = Actor::player("User");
        player.id = ActorId(0);
        player.location = park;
        let mut grumph = Actor::human("Grumph", "man");
        grumph.id = ActorId(1);
        grumph.location = home;
        Town {
            graph,
            entities: EntityStore::new(),
            actors: vec![player, grumph],
            park,
            alley,
            home,
        }
    }

    fn result(actor: usize, action: Action, locations: Vec<LocationId>) -> ExecutionResult {
        ExecutionResult {
            actor: ActorId(actor),
            action,
            targets: Vec::new(),
            locations,
            success: true,
            failure: None,
            extra_text: String::new(),
            time: 0.0,
        }
    }

    fn scene(town: &Town) -> Scene<'_> {
        Scene {
            graph: &town.graph,
            entities: &town.entities,
            actors: &town.actors,
        }
    }

    #[test]
    fn invisible_connection_hides_events() {
        let town = town();
        let reporter = Reporter::new(false, Cue::Visible);
        let pie = ItemId(0);
        let event = result(1, Action::Eat { item: pie }, vec![town.home]);
        assert!(!reporter.is_perceivable(&town.graph, &event, town.park));
        assert!(reporter.report(&scene(&town), ActorId(0), &[event]).is_empty());
    }

    #[test]
    fn visibility_does_not_chain() {
        let town = town();
        let reporter = Reporter::new(false, Cue::Visible);
        let event = result(1, Action::Look, vec![town.alley]);
        assert!(reporter.is_perceivable(&town.graph, &event, town.park));
        assert!(!reporter.is_perceivable(&town.graph, &event, town.home));
    }

    #[test]
    fn audible_cue_uses_audible_flags() {
        let town = town();
        let reporter = Reporter::new(false, Cue::Audible);
        let event = result(1, Action::Look, vec![town.home]);
        assert!(reporter.is_perceivable(&town.graph, &event, town.park));
        let lines = reporter.report(&scene(&town), ActorId(0), &[event]);
        assert_eq!(lines, vec!["I hear someone doing something nearby.".to_string()]);
    }

    #[test]
    fn moves_are_phrased_from_each_perspective() {
        let town = town();
        let reporter = Reporter::new(false, Cue::Visible);
        let theirs = result(
            1,
            Action::Move {
                destination: town.park,
            },
            vec![town.home, town.park],
        );
        let mine = result(
            0,
            Action::Move {
                destination: town.alley,
            },
            vec![town.park, town.alley],
        );
        let lines = reporter.report(&scene(&town), ActorId(0), &[theirs, mine]);
        assert_eq!(
            lines,
            vec![
                "Grumph moves north to the park.".to_string(),
                "I move west to the alley.".to_string()
            ]
        );
    }

    #[test]
    fn waits_are_hidden_unless_verbose() {
        let town = town();
        let wait = result(0, Action::Wait, vec![town.park]);
        let quiet = Reporter::new(false, Cue::Visible);
        assert!(quiet.report(&scene(&town), ActorId(0), &[wait.clone()]).is_empty());
        let verbose = Reporter::new(true, Cue::Visible);
        assert_eq!(verbose.report(&scene(&town), ActorId(0), &[wait]).len(), 1);
    }

    #[test]
    fn failures_read_as_attempts() {
        let mut town = town();
        let knife = town.entities.create(ItemSpec::new("statue")).unwrap();
        town.entities.place(knife, Owner::Location(town.park)).unwrap();
        let mut event = result(0, Action::Take { item: knife }, vec![town.park]);
        event.success = false;
        event.failure = Some(FailureReason::Blocked {
            reason: "It is bolted down.".to_string(),
        });
        let reporter = Reporter::new(false, Cue::Visible);
        assert_eq!(
            reporter.report(&scene(&town), ActorId(0), &[event]),
            vec!["I try to pick up the statue, but it is bolted down.".to_string()]
        );
    }
}
