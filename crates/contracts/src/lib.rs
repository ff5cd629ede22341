//! Cross-boundary contracts shared by the simulation kernel, the host CLI, and renderers.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod planning;
pub mod scheduler;

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

macro_rules! arena_handle {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

arena_handle!(LocationId, "location");
arena_handle!(ConnectionId, "connection");
arena_handle!(ItemId, "item");
arena_handle!(ActorId, "actor");

// ---------------------------------------------------------------------------
// Needs, tags, strategies
// ---------------------------------------------------------------------------

/// Closed set of things an actor can want.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Eat,
    Drink,
    Rest,
    Greed,
}

impl NeedKind {
    /// Item tag that marks an item as able to satisfy this need.
    pub fn satisfier(self) -> ItemTag {
        match self {
            NeedKind::Eat => ItemTag::Eat,
            NeedKind::Drink => ItemTag::Drink,
            NeedKind::Rest => ItemTag::Rest,
            NeedKind::Greed => ItemTag::Valuable,
        }
    }

    /// Consuming action that relieves this need directly, if any.
    ///
    /// Greed has none: valuables relieve it when they are acquired.
    pub fn consume(self, item: ItemId) -> Option<Action> {
        match self {
            NeedKind::Eat => Some(Action::Eat { item }),
            NeedKind::Drink => Some(Action::Drink { item }),
            NeedKind::Rest => Some(Action::Rest { item }),
            NeedKind::Greed => None,
        }
    }
}

impl fmt::Display for NeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NeedKind::Eat => "eat",
            NeedKind::Drink => "drink",
            NeedKind::Rest => "rest",
            NeedKind::Greed => "greed",
        };
        f.write_str(label)
    }
}

/// Capability tags carried by items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemTag {
    /// Can be picked up.
    Take,
    /// Must be in the inventory before it can be used.
    TakeReq,
    /// Survives consumption (a sink, a bed).
    Permanent,
    Eat,
    Drink,
    Rest,
    Valuable,
    Weapon,
    Openable,
    Container,
    Door,
    /// Lock can be picked.
    Pickable,
    /// Can pick a `pickable` lock.
    Pick,
    /// Currently held inside a container.
    Contained,
}

/// Resolution policy for a need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    /// Look in the inventory, then the current location; optionally wander when nothing is found.
    Search { roam: bool },
    /// A fixed action gated behind named conditions.
    Composite(CompositePlan),
    /// Handled by the itinerary; contributes no candidate of its own.
    Scheduled,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Search { roam: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositePlan {
    pub action: Action,
    pub conditions: Vec<Condition>,
}

/// A prerequisite for a composite action and how much it matters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub requirement: Requirement,
    /// Unmet conditions below the composite's priority are deferred; the rest block it.
    pub priority: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Requirement {
    /// Carry any item with this tag.
    Have(ItemTag),
    /// Carry this specific item.
    Hold(ItemId),
    /// Stand in this location.
    At(LocationId),
    /// Share a location with this actor.
    Near(ActorId),
}

// ---------------------------------------------------------------------------
// Verbs and actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Move,
    Take,
    Drop,
    Eat,
    Drink,
    Rest,
    Open,
    Close,
    Lock,
    Unlock,
    Withdraw,
    Talk,
    Rob,
    Look,
    Inventory,
    Wait,
}

impl Verb {
    /// Base duration in simulated seconds before division by actor speed.
    pub fn base_duration(self) -> f64 {
        match self {
            Verb::Move => 60.0,
            Verb::Take => 30.0,
            Verb::Drop => 10.0,
            Verb::Eat => 300.0,
            Verb::Drink => 30.0,
            Verb::Rest => 600.0,
            Verb::Open | Verb::Close => 5.0,
            Verb::Lock | Verb::Unlock => 10.0,
            Verb::Withdraw => 15.0,
            Verb::Talk => 20.0,
            Verb::Rob => 60.0,
            Verb::Look | Verb::Inventory | Verb::Wait => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Move => "move",
            Verb::Take => "take",
            Verb::Drop => "drop",
            Verb::Eat => "eat",
            Verb::Drink => "drink",
            Verb::Rest => "rest",
            Verb::Open => "open",
            Verb::Close => "close",
            Verb::Lock => "lock",
            Verb::Unlock => "unlock",
            Verb::Withdraw => "withdraw",
            Verb::Talk => "talk",
            Verb::Rob => "rob",
            Verb::Look => "look",
            Verb::Inventory => "inventory",
            Verb::Wait => "wait",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete, target-resolved action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum Action {
    Move { destination: LocationId },
    Take { item: ItemId },
    Drop { item: ItemId },
    Eat { item: ItemId },
    Drink { item: ItemId },
    Rest { item: ItemId },
    Open { item: ItemId },
    Close { item: ItemId },
    Lock { item: ItemId, key: ItemId },
    Unlock { item: ItemId, key: ItemId },
    Withdraw { item: ItemId, container: ItemId },
    Talk { target: ActorId },
    Rob { target: ActorId },
    Look,
    Inventory,
    Wait,
}

impl Action {
    pub fn verb(&self) -> Verb {
        match self {
            Action::Move { .. } => Verb::Move,
            Action::Take { .. } => Verb::Take,
            Action::Drop { .. } => Verb::Drop,
            Action::Eat { .. } => Verb::Eat,
            Action::Drink { .. } => Verb::Drink,
            Action::Rest { .. } => Verb::Rest,
            Action::Open { .. } => Verb::Open,
            Action::Close { .. } => Verb::Close,
            Action::Lock { .. } => Verb::Lock,
            Action::Unlock { .. } => Verb::Unlock,
            Action::Withdraw { .. } => Verb::Withdraw,
            Action::Talk { .. } => Verb::Talk,
            Action::Rob { .. } => Verb::Rob,
            Action::Look => Verb::Look,
            Action::Inventory => Verb::Inventory,
            Action::Wait => Verb::Wait,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Wait
    }
}

/// Anything an action can point at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    Location(LocationId),
    Item(ItemId),
    Actor(ActorId),
}

// ---------------------------------------------------------------------------
// Execution results
// ---------------------------------------------------------------------------

/// Why an action did not take effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    NoConnection,
    Blocked { reason: String },
    NotPresent,
    MissingTag { tag: ItemTag },
    MustTakeFirst,
    InventoryFull,
    NotInInventory,
    AlreadyOpen,
    AlreadyClosed,
    Locked,
    NotLocked,
    NotLockable,
    OpenLock,
    WrongKey,
    ContainerClosed,
    TargetAbsent,
    NothingToRob,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoConnection => f.write_str("there is no way through"),
            FailureReason::Blocked { reason } => f.write_str(reason),
            FailureReason::NotPresent => f.write_str("it is not here"),
            FailureReason::MissingTag { tag } => write!(f, "it cannot be used that way ({tag:?})"),
            FailureReason::MustTakeFirst => f.write_str("it has to be picked up first"),
            FailureReason::InventoryFull => f.write_str("hands are full"),
            FailureReason::NotInInventory => f.write_str("it is not being carried"),
            FailureReason::AlreadyOpen => f.write_str("it is already open"),
            FailureReason::AlreadyClosed => f.write_str("it is already closed"),
            FailureReason::Locked => f.write_str("it is locked"),
            FailureReason::NotLocked => f.write_str("it is not locked"),
            FailureReason::NotLockable => f.write_str("it has no lock"),
            FailureReason::OpenLock => f.write_str("it cannot be locked while open"),
            FailureReason::WrongKey => f.write_str("the key does not fit"),
            FailureReason::ContainerClosed => f.write_str("the container is closed"),
            FailureReason::TargetAbsent => f.write_str("nobody is there"),
            FailureReason::NothingToRob => f.write_str("there is nothing worth taking"),
        }
    }
}

/// Canonical event record produced by every execution, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub actor: ActorId,
    pub action: Action,
    pub targets: Vec<Target>,
    /// Where the event happened; perception is computed from these.
    pub locations: Vec<LocationId>,
    pub success: bool,
    pub failure: Option<FailureReason>,
    pub extra_text: String,
    /// Simulated time the action was executed at.
    pub time: f64,
}

impl ExecutionResult {
    pub fn verb(&self) -> Verb {
        self.action.verb()
    }
}

// ---------------------------------------------------------------------------
// Perception and time units
// ---------------------------------------------------------------------------

/// Channel through which the player can notice an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    #[default]
    Visible,
    Audible,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
}

impl TimeUnit {
    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Second => 1.0,
            TimeUnit::Minute => SECONDS_PER_MINUTE,
            TimeUnit::Hour => SECONDS_PER_HOUR,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Seconds since midnight at which the clock starts.
    pub start_time: f64,
    /// Default clock increment in seconds.
    pub step: f64,
    /// Simulated seconds between actor passes.
    pub resolution: f64,
    /// Internal ticks per real second while stepping normally.
    pub tick_rate: f64,
    /// Fraction of each accrual rate applied per update.
    pub need_update_size: f64,
    /// `K` in `K / (trigger - now + 1)`.
    pub itinerary_urgency: f64,
    pub catch_up_divisor: f64,
    pub catch_up_increment: f64,
    pub verbose: bool,
    pub cue: Cue,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            start_time: 33_600.0,
            step: 0.01,
            resolution: 1.0,
            tick_rate: 5000.0,
            need_update_size: 0.1,
            itinerary_urgency: 1000.0,
            catch_up_divisor: std::f64::consts::TAU,
            catch_up_increment: 0.1,
            verbose: false,
            cue: Cue::Visible,
        }
    }
}

pub use planning::{PlanEntry, PlanSource};
pub use scheduler::{ItineraryEntry, LoopPhase};
