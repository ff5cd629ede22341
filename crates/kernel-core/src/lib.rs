//! Needs-driven actor simulation kernel.
//!
//! A [`World`] owns the clock, the location graph, the item store, and every actor.
//! Each tick advances the clock; once per resolution interval every eligible actor
//! plans from its needs and executes the head of its plan, and the results are
//! filtered by what the player can see or hear.

pub mod actor;
pub mod clock;
pub mod entity;
pub mod error;
pub mod executor;
pub mod needs;
pub mod perception;
pub mod planner;
pub mod scheduler;
pub mod spatial;
pub mod world;

pub use actor::{Actor, ActorKind, Capabilities, Itinerary};
pub use clock::{clock_display, seconds_to_unit, unit_to_seconds, Clock};
pub use entity::{EntityStore, Item, ItemSpec, Latch, Owner};
pub use error::WorldError;
pub use needs::{Need, NeedState};
pub use perception::{list_to_natural, with_articles, Reporter, Scene};
pub use planner::{itinerary_priority, NeedPlanner, PlannerConfig, PlanningView};
pub use scheduler::Pacer;
pub use spatial::{Connection, Location, WorldGraph};
pub use world::{CommandError, World, WorldBuilder};
