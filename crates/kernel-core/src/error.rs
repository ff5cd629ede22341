use contracts::{ActorId, ConnectionId, ItemId, LocationId};

/// Authoring mistakes caught while the world is being built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("a connection between {a} and {b} already exists")]
    DuplicateConnection { a: LocationId, b: LocationId },
    #[error("{0} cannot connect to itself")]
    SelfConnection(LocationId),
    #[error("unknown {0}")]
    UnknownLocation(LocationId),
    #[error("unknown {0}")]
    UnknownConnection(ConnectionId),
    #[error("unknown {0}")]
    UnknownItem(ItemId),
    #[error("unknown {0}")]
    UnknownActor(ActorId),
    #[error("lockable {0} has no key")]
    LockWithoutKey(ItemId),
    #[error("door {0} is not attached to a connection")]
    DoorWithoutConnection(ItemId),
    #[error("{0} is already placed in the world")]
    ItemAlreadyPlaced(ItemId),
    #[error("inventory of {0} is full")]
    InventoryFull(ActorId),
    #[error("{0} is not a container")]
    NotAContainer(ItemId),
    #[error("no actor has been designated as the player")]
    MissingPlayer,
}
