//! Entity store: items, their tags, and single-owner bookkeeping.
//!
//! Every placed item lives in exactly one collection: a location's floor, an actor's
//! inventory, or a container's contents. All moves go through [`EntityStore::transfer`],
//! which detaches from the old owner before attaching to the new one.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{ActorId, ConnectionId, ItemId, ItemTag, LocationId};

use crate::error::WorldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Created but not yet put anywhere.
    Unplaced,
    Location(LocationId),
    Actor(ActorId),
    Container(ItemId),
    /// Consumed; no collection holds it any more.
    Destroyed,
}

/// Open/closed and lock state for doors and containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Latch {
    pub closed: bool,
    pub locked: bool,
    pub lockable: bool,
    pub key: Option<ItemId>,
}

impl Latch {
    pub fn open() -> Self {
        Self {
            closed: false,
            locked: false,
            lockable: false,
            key: None,
        }
    }

    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::open()
        }
    }

    pub fn locked_with(key: ItemId) -> Self {
        Self {
            closed: true,
            locked: true,
            lockable: true,
            key: Some(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub tags: BTreeSet<ItemTag>,
    /// Relief granted when consumed, or worth for valuables.
    pub value: f64,
    pub latch: Option<Latch>,
    /// Connection a door controls.
    pub door: Option<ConnectionId>,
    owner: Owner,
}

impl Item {
    pub fn has_tag(&self, tag: ItemTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn is_closed(&self) -> bool {
        self.latch.as_ref().is_some_and(|latch| latch.closed)
    }
}

/// Construction-time description of an item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemSpec {
    pub name: String,
    pub description: Option<String>,
    pub tags: BTreeSet<ItemTag>,
    pub value: f64,
    pub latch: Option<Latch>,
    pub door: Option<ConnectionId>,
}

impl ItemSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn food(name: impl Into<String>, value: f64) -> Self {
        Self::new(name).tags([ItemTag::Take, ItemTag::Eat]).value(value)
    }

    pub fn drink(name: impl Into<String>, value: f64) -> Self {
        Self::new(name).tags([ItemTag::Drink]).value(value)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = ItemTag>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn latch(mut self, latch: Latch) -> Self {
        self.latch = Some(latch);
        self
    }

    pub fn door(mut self, connection: ConnectionId) -> Self {
        self.door = Some(connection);
        self.tags.extend([ItemTag::Door, ItemTag::Openable]);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    items: Vec<Item>,
    at_location: BTreeMap<LocationId, Vec<ItemId>>,
    carried: BTreeMap<ActorId, Vec<ItemId>>,
    contents: BTreeMap<ItemId, Vec<ItemId>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Lockable latches must name a key; doors must name a connection.
    pub fn create(&mut self, spec: ItemSpec) -> Result<ItemId, WorldError> {
        let id = ItemId(self.items.len());
        if let Some(latch) = &spec.latch {
            if latch.lockable && latch.key.is_none() {
                log::warn!("lockable item '{}' has no key", spec.name);
                return Err(WorldError::LockWithoutKey(id));
            }
        }
        if spec.tags.contains(&ItemTag::Door) && spec.door.is_none() {
            return Err(WorldError::DoorWithoutConnection(id));
        }
        let description = spec.description.unwrap_or_else(|| spec.name.clone());
        self.items.push(Item {
            id,
            name: spec.name,
            description,
            tags: spec.tags,
            value: spec.value,
            latch: spec.latch,
            door: spec.door,
            owner: Owner::Unplaced,
        });
        Ok(id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    pub fn latch_mut(&mut self, id: ItemId) -> Option<&mut Latch> {
        self.items.get_mut(id.index())?.latch.as_mut()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn owner(&self, id: ItemId) -> Option<Owner> {
        self.item(id).map(Item::owner)
    }

    pub fn has_tag(&self, id: ItemId, tag: ItemTag) -> bool {
        self.item(id).is_some_and(|item| item.has_tag(tag))
    }

    pub fn items_at(&self, location: LocationId) -> &[ItemId] {
        self.at_location
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn inventory(&self, actor: ActorId) -> &[ItemId] {
        self.carried.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contents(&self, container: ItemId) -> &[ItemId] {
        self.contents
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First item among `ids` carrying `tag`.
    pub fn first_tagged(&self, ids: &[ItemId], tag: ItemTag) -> Option<ItemId> {
        ids.iter().copied().find(|id| self.has_tag(*id, tag))
    }

    /// Put a freshly created item somewhere. Fails if it was already placed.
    pub fn place(&mut self, item: ItemId, owner: Owner) -> Result<(), WorldError> {
        let current = self.owner(item).ok_or(WorldError::UnknownItem(item))?;
        if current != Owner::Unplaced {
            return Err(WorldError::ItemAlreadyPlaced(item));
        }
        if let Owner::Container(container) = owner {
            if !self.has_tag(container, ItemTag::Container) {
                return Err(WorldError::NotAContainer(container));
            }
        }
        self.transfer(item, owner);
        Ok(())
    }

    /// Move `item` to `to`, detaching it from its current collection first.
    pub(crate) fn transfer(&mut self, item: ItemId, to: Owner) {
        let Some(current) = self.owner(item) else {
            return;
        };
        self.detach(item, current);
        match to {
            Owner::Location(location) => self.at_location.entry(location).or_default().push(item),
            Owner::Actor(actor) => self.carried.entry(actor).or_default().push(item),
            Owner::Container(container) => self.contents.entry(container).or_default().push(item),
            Owner::Unplaced | Owner::Destroyed => {}
        }
        let entry = &mut self.items[item.index()];
        entry.owner = to;
        if matches!(to, Owner::Container(_)) {
            entry.tags.insert(ItemTag::Contained);
        } else {
            entry.tags.remove(&ItemTag::Contained);
        }
    }

    pub(crate) fn destroy(&mut self, item: ItemId) {
        self.transfer(item, Owner::Destroyed);
    }

    fn detach(&mut self, item: ItemId, from: Owner) {
        let list = match from {
            Owner::Location(location) => self.at_location.get_mut(&location),
            Owner::Actor(actor) => self.carried.get_mut(&actor),
            Owner::Container(container) => self.contents.get_mut(&container),
            Owner::Unplaced | Owner::Destroyed => None,
        };
        if let Some(list) = list {
            list.retain(|id| *id != item);
        }
    }

    /// Check that every placed item sits in exactly the collection its owner names.
    pub fn verify_ownership(&self) -> Result<(), String> {
        let mut seen = BTreeMap::<ItemId, usize>::new();
        let collections = self
            .at_location
            .values()
            .chain(self.carried.values())
            .chain(self.contents.values());
        for list in collections {
            for id in list {
                *seen.entry(*id).or_insert(0) += 1;
            }
        }
        for item in &self.items {
            let count = seen.get(&item.id).copied().unwrap_or(0);
            let listed = match item.owner {
                Owner::Location(location) => self.items_at(location).contains(&item.id),
                Owner::Actor(actor) => self.inventory(actor).contains(&item.id),
                Owner::Container(container) => self.contents(container).contains(&item.id),
                Owner::Unplaced | Owner::Destroyed => true,
            };
            let expected = match item.owner {
                Owner::Unplaced | Owner::Destroyed => 0,
                _ => 1,
            };
            if count != expected || !listed {
                return Err(format!(
                    "{} ({}) owned by {:?} appears in {} collections",
                    item.id, item.name, item.owner, count
                ));
            }
        }
        Ok(())
    }
}
