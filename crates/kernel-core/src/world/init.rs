use contracts::{ConnectionId, ItemId, ItemTag, LocationId, NeedKind};

use crate::entity::{ItemSpec, Latch, Owner};
use crate::needs::Need;
use crate::spatial::DOOR_CLOSED_REASON;

use super::*;

/// Assembles a world. Every authoring mistake surfaces here as a [`WorldError`].
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    config: SimConfig,
    graph: WorldGraph,
    entities: EntityStore,
    actors: Vec<Actor>,
    player: Option<ActorId>,
}

impl WorldBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            graph: WorldGraph::new(),
            entities: EntityStore::new(),
            actors: Vec::new(),
            player: None,
        }
    }

    pub fn location(&mut self, name: &str, description: &str, tags: &[&str]) -> LocationId {
        let tags = tags.iter().map(|t| t.to_string()).collect();
        self.graph.add_location(name, description, tags)
    }

    pub fn connect(
        &mut self,
        a: LocationId,
        b: LocationId,
        dir_from_a: &str,
        dir_from_b: &str,
        visible: bool,
        audible: bool,
    ) -> Result<ConnectionId, WorldError> {
        self.graph
            .connect(a, b, dir_from_a, dir_from_b, visible, audible)
    }

    /// Block a connection with a fixed reason (rubble, a locked gate without a door item).
    pub fn block(&mut self, connection: ConnectionId, reason: &str) -> Result<(), WorldError> {
        self.graph
            .connection_mut(connection)
            .ok_or(WorldError::UnknownConnection(connection))?
            .block(reason);
        Ok(())
    }

    /// Put a door on `connection`, lying at its first endpoint. A closed door blocks it.
    pub fn door(
        &mut self,
        connection: ConnectionId,
        spec: ItemSpec,
        latch: Latch,
    ) -> Result<ItemId, WorldError> {
        let (side, closed) = {
            let conn = self
                .graph
                .connection(connection)
                .ok_or(WorldError::UnknownConnection(connection))?;
            (conn.a, latch.closed)
        };
        let item = self.item(spec.door(connection).latch(latch), Owner::Location(side))?;
        if closed {
            self.block(connection, DOOR_CLOSED_REASON)?;
        }
        Ok(item)
    }

    /// Create an item and place it. Items given to actors count against their capacity.
    pub fn item(&mut self, spec: ItemSpec, owner: Owner) -> Result<ItemId, WorldError> {
        match owner {
            Owner::Location(location) if !self.graph.contains(location) => {
                return Err(WorldError::UnknownLocation(location));
            }
            Owner::Actor(actor) => {
                let holder = self
                    .actors
                    .get(actor.index())
                    .ok_or(WorldError::UnknownActor(actor))?;
                if self.entities.inventory(actor).len() >= holder.inventory_capacity {
                    return Err(WorldError::InventoryFull(actor));
                }
            }
            Owner::Container(container) if self.entities.item(container).is_none() => {
                return Err(WorldError::UnknownItem(container));
            }
            _ => {}
        }
        let id = self.entities.create(spec)?;
        self.entities.place(id, owner)?;
        Ok(id)
    }

    pub fn actor(&mut self, mut actor: Actor, at: LocationId) -> Result<ActorId, WorldError> {
        let id = ActorId(self.actors.len());
        self.graph.place_actor(at, id)?;
        actor.id = id;
        actor.location = at;
        self.actors.push(actor);
        Ok(id)
    }

    /// Add the actor steered by external commands. A later call replaces the designation.
    pub fn player(&mut self, actor: Actor, at: LocationId) -> Result<ActorId, WorldError> {
        let id = self.actor(actor, at)?;
        self.player = Some(id);
        Ok(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor, WorldError> {
        self.actors
            .get_mut(id.index())
            .ok_or(WorldError::UnknownActor(id))
    }

    pub fn build(self) -> Result<World, WorldError> {
        let player = self.player.ok_or(WorldError::MissingPlayer)?;
        Ok(World::from_parts(
            self.config,
            self.graph,
            self.entities,
            self.actors,
            player,
        ))
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

impl World {
    /// A small town: three households, a park, an alley, and a restaurant.
    pub fn demo(config: SimConfig) -> Result<World, WorldError> {
        let mut b = WorldBuilder::new(config);

        let alley = b.location("the alley", "A dark alley.", &["exterior"]);
        let park = b.location("the park", "Look at this grass.", &["exterior"]);
        let torgi = b.location(
            "the Torgi household",
            "The cluttered home of a man named Torgi.",
            &["interior"],
        );
        let mansname = b.location(
            "the Mansname household",
            "Wow! It's hard to come up with descriptions!",
            &["interior"],
        );
        let van_fleek = b.location("the Van Fleek household", "Reeks of pie.", &["interior"]);
        let grille = b.location(
            "the Barren Grille",
            "I hear they have great dessert.",
            &["interior"],
        );

        b.connect(torgi, park, "north", "south", false, true)?;
        b.connect(torgi, grille, "west", "east", false, true)?;
        b.connect(grille, park, "north", "south", false, true)?;
        b.connect(park, alley, "north", "south", true, true)?;
        b.connect(van_fleek, alley, "west", "east", false, true)?;
        b.connect(mansname, alley, "east", "west", false, true)?;

        let knife = b.item(
            ItemSpec::new("knife")
                .description("Sharp as all heck.")
                .tags([ItemTag::Take, ItemTag::Weapon]),
            Owner::Location(torgi),
        )?;
        b.item(
            ItemSpec::food("pie", 10.0).description("A freshly baked pie."),
            Owner::Location(grille),
        )?;
        b.item(
            ItemSpec::drink("fountain", 4.0)
                .description("A stone drinking fountain.")
                .tags([ItemTag::Permanent]),
            Owner::Location(park),
        )?;

        let grumph = b.actor(
            Actor::human("Grumph", "man").described("A villain!"),
            torgi,
        )?;
        b.actor(
            Actor::human("Silbert", "man").described("Looks like a respectable fellow."),
            torgi,
        )?;
        let gerty = b.actor(
            Actor::human("Gerty", "woman").described("An old pie woman of some sort."),
            van_fleek,
        )?;
        b.item(
            ItemSpec::food("pie", 10.0).description("A freshly baked pie."),
            Owner::Actor(gerty),
        )?;
        b.actor(
            Actor::human("Melissa", "woman").described("Just wed; nee Forthod."),
            mansname,
        )?;
        b.actor(
            Actor::human("Ella", "woman").described("Should be named deMaitreDe."),
            grille,
        )?;

        b.actor_mut(grumph)?.itinerary.add(36_000.0, Action::Take { item: knife });
        b.actor_mut(grumph)?
            .itinerary
            .add(43_200.0, Action::Move { destination: park });
        b.actor_mut(grumph)?
            .itinerary
            .add(57_600.0, Action::Move { destination: alley });

        b.player(Actor::player("User"), park)?;
        b.build()
    }

    /// A hotel room with a hungry cat and a hallway full of cat food.
    pub fn hotel(config: SimConfig) -> Result<World, WorldError> {
        let mut b = WorldBuilder::new(config);

        let room = b.location("Room 27", "My hotel room.", &["interior"]);
        let hallway = b.location(
            "the second floor hallway",
            "A long narrow hallway.",
            &["interior"],
        );
        let doorway = b.connect(room, hallway, "south", "north", true, true)?;
        b.door(
            doorway,
            ItemSpec::new("door").description("An old wooden door."),
            Latch::open(),
        )?;

        b.item(ItemSpec::new("car key").tags([ItemTag::Take]), Owner::Location(room))?;
        let cat_food = || ItemSpec::food("cat food", 6.0);
        b.item(cat_food(), Owner::Location(room))?;
        for _ in 0..3 {
            b.item(cat_food(), Owner::Location(hallway))?;
        }

        let cat = Actor::animal("cat")
            .described("He looks like he has a big appetite.")
            .with_need(Need::new(NeedKind::Eat, 15.0, 15.0));
        let cat = b.actor(cat, room)?;
        b.item(cat_food(), Owner::Actor(cat))?;

        b.player(Actor::player("User"), room)?;
        b.build()
    }
}
