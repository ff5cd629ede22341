//! Actors: one data structure for people and animals, distinguished by kind and capabilities.

use contracts::{Action, ActorId, ItineraryEntry, LocationId, NeedKind, Strategy};

use crate::needs::{Need, NeedState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Human,
    Animal,
}

/// What an actor is able to do on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Builds plans from its needs when eligible.
    pub plans: bool,
    /// Injects itinerary entries into its plans.
    pub follows_itinerary: bool,
    /// Can `talk`.
    pub speaks: bool,
}

impl Capabilities {
    pub fn for_kind(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Human => Self {
                plans: true,
                follows_itinerary: true,
                speaks: true,
            },
            ActorKind::Animal => Self {
                plans: true,
                follows_itinerary: false,
                speaks: true,
            },
        }
    }
}

/// Scheduled future actions, kept sorted by trigger time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Itinerary {
    entries: Vec<ItineraryEntry>,
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after any entries with the same or earlier trigger time.
    pub fn add(&mut self, trigger_time: f64, action: Action) {
        let at = self
            .entries
            .partition_point(|entry| entry.trigger_time <= trigger_time);
        self.entries.insert(
            at,
            ItineraryEntry {
                trigger_time,
                action,
            },
        );
    }

    /// The earliest pending entry.
    pub fn head(&self) -> Option<&ItineraryEntry> {
        self.entries.first()
    }

    /// Drop the head if `action` matches it. Returns whether it did.
    pub fn satisfy(&mut self, action: &Action) -> bool {
        match self.entries.first() {
            Some(head) if head.action == *action => {
                self.entries.remove(0);
                true
            }
            _ => false,
        }
    }

    pub fn entries(&self) -> &[ItineraryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub proper_name: String,
    pub common_name: String,
    pub description: String,
    pub kind: ActorKind,
    pub capabilities: Capabilities,
    pub needs: NeedState,
    pub itinerary: Itinerary,
    pub inventory_capacity: usize,
    /// Priority of the fallback `wait` candidate.
    pub laziness: f64,
    /// Divides every action's base duration.
    pub speed: f64,
    pub sounds: Vec<String>,
    pub location: LocationId,
    next_eligible: f64,
}

impl Actor {
    pub fn human(proper_name: impl Into<String>, common_name: impl Into<String>) -> Self {
        let stay = Strategy::Search { roam: false };
        let needs = NeedState::new()
            .with(Need::new(NeedKind::Eat, 3.0, 1.0).with_strategy(stay.clone()))
            .with(Need::new(NeedKind::Drink, 3.0, 1.0).with_strategy(stay));
        Self::base(
            ActorKind::Human,
            proper_name.into(),
            common_name.into(),
            "A regular human being.",
            needs,
            5,
        )
    }

    pub fn animal(common_name: impl Into<String>) -> Self {
        let common_name = common_name.into();
        let needs = NeedState::new()
            .with(Need::new(NeedKind::Eat, 3.0, 1.0))
            .with(Need::new(NeedKind::Drink, 3.0, 1.0));
        let mut actor = Self::base(
            ActorKind::Animal,
            common_name.clone(),
            common_name,
            "",
            needs,
            1,
        );
        actor.sounds = vec!["meow".to_string(), "purr".to_string()];
        actor
    }

    /// A human steered by external commands rather than its own plans.
    pub fn player(proper_name: impl Into<String>) -> Self {
        let mut actor = Self::human(proper_name, "me");
        actor.description = "This is the person that I am.".to_string();
        actor.capabilities.plans = false;
        actor.capabilities.follows_itinerary = false;
        actor.inventory_capacity = 10;
        actor
    }

    fn base(
        kind: ActorKind,
        proper_name: String,
        common_name: String,
        description: &str,
        needs: NeedState,
        inventory_capacity: usize,
    ) -> Self {
        Self {
            id: ActorId(0),
            proper_name,
            common_name,
            description: description.to_string(),
            kind,
            capabilities: Capabilities::for_kind(kind),
            needs,
            itinerary: Itinerary::new(),
            inventory_capacity,
            laziness: 5.0,
            speed: 1.0,
            sounds: Vec::new(),
            location: LocationId(0),
            next_eligible: 0.0,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_need(mut self, need: Need) -> Self {
        self.needs.insert(need);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.inventory_capacity = capacity;
        self
    }

    pub fn with_laziness(mut self, laziness: f64) -> Self {
        self.laziness = laziness;
        self
    }

    pub fn with_sounds(mut self, sounds: &[&str]) -> Self {
        self.sounds = sounds.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_itinerary(mut self, entries: &[(f64, Action)]) -> Self {
        for (trigger_time, action) in entries {
            self.itinerary.add(*trigger_time, *action);
        }
        self
    }

    /// How others refer to this actor: people by proper name, animals by common name.
    pub fn display_name(&self) -> String {
        match self.kind {
            ActorKind::Human => self.proper_name.clone(),
            ActorKind::Animal if self.proper_name != self.common_name => self.proper_name.clone(),
            ActorKind::Animal => format!("the {}", self.common_name.to_lowercase()),
        }
    }

    pub fn next_eligible(&self) -> f64 {
        self.next_eligible
    }

    pub fn is_eligible(&self, now: f64) -> bool {
        self.next_eligible <= now
    }

    /// Seconds an action with `base` duration takes this actor.
    pub fn duration_of(&self, base: f64) -> f64 {
        if self.speed > 0.0 && self.speed.is_finite() {
            base / self.speed
        } else {
            base
        }
    }

    /// Push eligibility out to `until`; never pulls it earlier.
    pub(crate) fn defer_until(&mut self, until: f64) {
        if until.is_finite() && until > self.next_eligible {
            self.next_eligible = until;
        }
    }
}
