//! World graph: locations, connections, live exits, path discovery, and perception reach.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{ActorId, ConnectionId, Cue, LocationId};
use log::warn;

use crate::error::WorldError;

pub const DOOR_CLOSED_REASON: &str = "The door is closed.";

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// A node in the world graph (room, road, park).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    /// Free-form tags (e.g. "interior", "exterior").
    pub tags: Vec<String>,
    pub connections: Vec<ConnectionId>,
    pub actors: Vec<ActorId>,
}

impl Location {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blockage {
    pub reason: String,
}

/// An undirected edge between two locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub a: LocationId,
    pub b: LocationId,
    /// Direction label when leaving `a` toward `b`.
    pub dir_from_a: String,
    /// Direction label when leaving `b` toward `a`.
    pub dir_from_b: String,
    /// Events at one end can be seen from the other.
    pub visible: bool,
    /// Events at one end can be heard from the other.
    pub audible: bool,
    blocked: Option<Blockage>,
    stashed: Option<Blockage>,
}

impl Connection {
    /// The far end when leaving from `from`, or `None` if `from` is not an endpoint.
    pub fn other(&self, from: LocationId) -> Option<LocationId> {
        if from == self.a {
            Some(self.b)
        } else if from == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn direction_from(&self, from: LocationId) -> Option<&str> {
        if from == self.a {
            Some(&self.dir_from_a)
        } else if from == self.b {
            Some(&self.dir_from_b)
        } else {
            None
        }
    }

    pub fn joins(&self, x: LocationId, y: LocationId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    pub fn blocked_reason(&self) -> Option<&str> {
        self.blocked.as_ref().map(|b| b.reason.as_str())
    }

    pub fn block(&mut self, reason: impl Into<String>) {
        self.blocked = Some(Blockage {
            reason: reason.into(),
        });
    }

    /// Clear the blockage, returning whatever was there.
    pub fn unblock(&mut self) -> Option<Blockage> {
        self.blocked.take()
    }

    /// Unblock for passage, remembering the blockage so `close` can restore it.
    pub fn open(&mut self) {
        self.stashed = self.blocked.take();
    }

    /// Restore the blockage saved by `open`, or block with `default_reason`.
    pub fn close(&mut self, default_reason: &str) {
        let restored = self.stashed.take().unwrap_or_else(|| Blockage {
            reason: default_reason.to_string(),
        });
        self.blocked = Some(restored);
    }

    fn carries(&self, cue: Cue) -> bool {
        match cue {
            Cue::Visible => self.visible,
            Cue::Audible => self.audible,
        }
    }
}

/// Outcome of a path search, including every node the search expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSearch {
    /// Locations from a start to a goal, inclusive; `None` when unreachable.
    pub path: Option<Vec<LocationId>>,
    pub expanded: Vec<LocationId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    Goal,
}

// ---------------------------------------------------------------------------
// WorldGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct WorldGraph {
    locations: Vec<Location>,
    connections: Vec<Connection>,
}

impl WorldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Location management ---

    pub fn add_location(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
    ) -> LocationId {
        let id = LocationId(self.locations.len());
        self.locations.push(Location {
            id,
            name: name.into(),
            description: description.into(),
            tags,
            connections: Vec::new(),
            actors: Vec::new(),
        });
        id
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn contains(&self, id: LocationId) -> bool {
        id.index() < self.locations.len()
    }

    pub fn find_location(&self, name: &str) -> Option<LocationId> {
        self.locations
            .iter()
            .find(|loc| loc.name.eq_ignore_ascii_case(name))
            .map(|loc| loc.id)
    }

    pub fn place_actor(&mut self, location: LocationId, actor: ActorId) -> Result<(), WorldError> {
        let loc = self
            .locations
            .get_mut(location.index())
            .ok_or(WorldError::UnknownLocation(location))?;
        if !loc.actors.contains(&actor) {
            loc.actors.push(actor);
        }
        Ok(())
    }

    pub fn remove_actor(&mut self, location: LocationId, actor: ActorId) {
        if let Some(loc) = self.locations.get_mut(location.index()) {
            loc.actors.retain(|a| *a != actor);
        }
    }

    // --- Connections ---

    /// Join `a` and `b`. At most one connection may exist between a pair of locations.
    pub fn connect(
        &mut self,
        a: LocationId,
        b: LocationId,
        dir_from_a: impl Into<String>,
        dir_from_b: impl Into<String>,
        visible: bool,
        audible: bool,
    ) -> Result<ConnectionId, WorldError> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(WorldError::UnknownLocation(id));
            }
        }
        if a == b {
            return Err(WorldError::SelfConnection(a));
        }
        if self.connection_between(a, b).is_some() {
            warn!("connection already exists between {a} and {b}; ignoring");
            return Err(WorldError::DuplicateConnection { a, b });
        }

        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection {
            id,
            a,
            b,
            dir_from_a: dir_from_a.into(),
            dir_from_b: dir_from_b.into(),
            visible,
            audible,
            blocked: None,
            stashed: None,
        });
        self.locations[a.index()].connections.push(id);
        self.locations[b.index()].connections.push(id);
        Ok(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.index())
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id.index())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_between(&self, x: LocationId, y: LocationId) -> Option<ConnectionId> {
        self.location(x)?
            .connections
            .iter()
            .copied()
            .find(|id| self.connections[id.index()].joins(x, y))
    }

    fn connections_of(&self, location: LocationId) -> impl Iterator<Item = &Connection> + '_ {
        self.location(location)
            .into_iter()
            .flat_map(|loc| loc.connections.iter())
            .map(|id| &self.connections[id.index()])
    }

    /// Connections out of `location` that are not blocked right now.
    pub fn open_exits(&self, location: LocationId) -> Vec<ConnectionId> {
        self.connections_of(location)
            .filter(|c| !c.is_blocked())
            .map(|c| c.id)
            .collect()
    }

    /// Destinations reachable from `location` through unblocked connections.
    pub fn neighbors(&self, location: LocationId) -> BTreeSet<LocationId> {
        self.connections_of(location)
            .filter(|c| !c.is_blocked())
            .filter_map(|c| c.other(location))
            .collect()
    }

    fn adjacent(&self, location: LocationId, respect_blocked: bool) -> Vec<LocationId> {
        self.connections_of(location)
            .filter(|c| !respect_blocked || !c.is_blocked())
            .filter_map(|c| c.other(location))
            .collect()
    }

    // --- Path discovery ---

    /// Shortest route from any of `starts` to any of `goals`, or `None` when unreachable.
    ///
    /// Blocked connections are traversable unless `respect_blocked` is set.
    pub fn find_path(
        &self,
        starts: &[LocationId],
        goals: &[LocationId],
        respect_blocked: bool,
    ) -> Option<Vec<LocationId>> {
        self.search_path(starts, goals, respect_blocked).path
    }

    /// Bidirectional breadth-first search. Both frontiers share one visited map, so no
    /// location is expanded twice and cycles terminate.
    pub fn search_path(
        &self,
        starts: &[LocationId],
        goals: &[LocationId],
        respect_blocked: bool,
    ) -> PathSearch {
        let mut visited: BTreeMap<LocationId, (Side, Option<LocationId>)> = BTreeMap::new();
        let mut expanded = Vec::new();

        let mut start_frontier = Vec::new();
        for &start in starts {
            if self.contains(start) && !visited.contains_key(&start) {
                visited.insert(start, (Side::Start, None));
                start_frontier.push(start);
            }
        }

        let mut goal_frontier = Vec::new();
        for &goal in goals {
            if !self.contains(goal) {
                continue;
            }
            match visited.get(&goal) {
                Some((Side::Start, _)) => {
                    return PathSearch {
                        path: Some(vec![goal]),
                        expanded,
                    }
                }
                Some(_) => {}
                None => {
                    visited.insert(goal, (Side::Goal, None));
                    goal_frontier.push(goal);
                }
            }
        }

        while !start_frontier.is_empty() && !goal_frontier.is_empty() {
            if let Some((near, far)) = self.expand_frontier(
                &mut start_frontier,
                Side::Start,
                &mut visited,
                &mut expanded,
                respect_blocked,
            ) {
                return PathSearch {
                    path: Some(stitch(near, far, &visited)),
                    expanded,
                };
            }
            if start_frontier.is_empty() {
                break;
            }
            if let Some((near, far)) = self.expand_frontier(
                &mut goal_frontier,
                Side::Goal,
                &mut visited,
                &mut expanded,
                respect_blocked,
            ) {
                return PathSearch {
                    path: Some(stitch(far, near, &visited)),
                    expanded,
                };
            }
        }

        PathSearch {
            path: None,
            expanded,
        }
    }

    /// Grow `frontier` by one level. Returns the crossing edge `(ours, theirs)` on contact.
    fn expand_frontier(
        &self,
        frontier: &mut Vec<LocationId>,
        side: Side,
        visited: &mut BTreeMap<LocationId, (Side, Option<LocationId>)>,
        expanded: &mut Vec<LocationId>,
        respect_blocked: bool,
    ) -> Option<(LocationId, LocationId)> {
        let mut next = Vec::new();
        for &node in frontier.iter() {
            expanded.push(node);
            for neighbor in self.adjacent(node, respect_blocked) {
                match visited.get(&neighbor) {
                    Some((owner, _)) if *owner != side => return Some((node, neighbor)),
                    Some(_) => {}
                    None => {
                        visited.insert(neighbor, (side, Some(node)));
                        next.push(neighbor);
                    }
                }
            }
        }
        *frontier = next;
        None
    }

    // --- Perception reach ---

    /// `locations` plus every location one connection away that carries `cue`.
    pub fn perceivable_from(&self, locations: &[LocationId], cue: Cue) -> BTreeSet<LocationId> {
        let mut reach = BTreeSet::new();
        for &location in locations {
            if !self.contains(location) {
                continue;
            }
            reach.insert(location);
            for connection in self.connections_of(location) {
                if connection.carries(cue) {
                    if let Some(other) = connection.other(location) {
                        reach.insert(other);
                    }
                }
            }
        }
        reach
    }
}

/// Join the start-side chain ending at `start_side` with the goal-side chain from `goal_side`.
fn stitch(
    start_side: LocationId,
    goal_side: LocationId,
    visited: &BTreeMap<LocationId, (Side, Option<LocationId>)>,
) -> Vec<LocationId> {
    let mut path = Vec::new();
    let mut cursor = Some(start_side);
    while let Some(node) = cursor {
        path.push(node);
        cursor = visited.get(&node).and_then(|(_, parent)| *parent);
    }
    path.reverse();

    let mut cursor = Some(goal_side);
    while let Some(node) = cursor {
        path.push(node);
        cursor = visited.get(&node).and_then(|(_, parent)| *parent);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> (WorldGraph, Vec<LocationId>) {
        let mut graph = WorldGraph::new();
        let ids = (0..n)
            .map(|i| graph.add_location(format!("room {i}"), "", Vec::new()))
            .collect::<Vec<_>>();
        for pair in ids.windows(2) {
            graph
                .connect(pair[0], pair[1], "east", "west", false, true)
                .unwrap();
        }
        (graph, ids)
    }

    fn assert_walkable(graph: &WorldGraph, path: &[LocationId]) {
        for pair in path.windows(2) {
            assert!(
                graph.connection_between(pair[0], pair[1]).is_some(),
                "{} and {} are not adjacent",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn duplicate_connection_is_rejected() {
        let (mut graph, ids) = line(2);
        let err = graph
            .connect(ids[1], ids[0], "west", "east", true, true)
            .unwrap_err();
        assert_eq!(
            err,
            WorldError::DuplicateConnection {
                a: ids[1],
                b: ids[0]
            }
        );
        assert_eq!(graph.connections().len(), 1);
        assert_eq!(graph.location(ids[0]).unwrap().connections.len(), 1);
    }

    #[test]
    fn self_connection_is_rejected() {
        let (mut graph, ids) = line(1);
        assert_eq!(
            graph.connect(ids[0], ids[0], "up", "down", false, false),
            Err(WorldError::SelfConnection(ids[0]))
        );
    }

    #[test]
    fn neighbors_reflect_live_blocked_state() {
        let (mut graph, ids) = line(3);
        assert_eq!(graph.neighbors(ids[1]).len(), 2);
        let conn = graph.connection_between(ids[1], ids[2]).unwrap();
        graph.connection_mut(conn).unwrap().block("rubble");
        assert_eq!(graph.neighbors(ids[1]), BTreeSet::from([ids[0]]));
        graph.connection_mut(conn).unwrap().unblock();
        assert_eq!(graph.neighbors(ids[1]).len(), 2);
    }

    #[test]
    fn directions_depend_on_side() {
        let (graph, ids) = line(2);
        let conn = graph.connection(ConnectionId(0)).unwrap();
        assert_eq!(conn.direction_from(ids[0]), Some("east"));
        assert_eq!(conn.direction_from(ids[1]), Some("west"));
        assert_eq!(conn.other(ids[1]), Some(ids[0]));
    }

    #[test]
    fn open_then_close_restores_prior_blockage() {
        let (mut graph, _) = line(2);
        let conn = graph.connection_mut(ConnectionId(0)).unwrap();
        conn.block("A heavy oak door bars the way.");
        conn.open();
        assert!(!conn.is_blocked());
        conn.close(DOOR_CLOSED_REASON);
        assert_eq!(conn.blocked_reason(), Some("A heavy oak door bars the way."));
    }

    #[test]
    fn close_without_open_uses_default_reason() {
        let (mut graph, _) = line(2);
        let conn = graph.connection_mut(ConnectionId(0)).unwrap();
        conn.close(DOOR_CLOSED_REASON);
        assert_eq!(conn.blocked_reason(), Some(DOOR_CLOSED_REASON));
    }

    #[test]
    fn path_along_a_line() {
        let (graph, ids) = line(6);
        let path = graph.find_path(&[ids[0]], &[ids[5]], false).unwrap();
        assert_eq!(path, ids);
    }

    #[test]
    fn path_when_start_is_goal() {
        let (graph, ids) = line(3);
        assert_eq!(
            graph.find_path(&[ids[0], ids[1]], &[ids[1]], false),
            Some(vec![ids[1]])
        );
    }

    #[test]
    fn path_picks_any_start_and_goal() {
        let (graph, ids) = line(7);
        let path = graph
            .find_path(&[ids[0], ids[3]], &[ids[6], ids[5]], false)
            .unwrap();
        assert_eq!(path, vec![ids[3], ids[4], ids[5]]);
    }

    #[test]
    fn path_on_cycle_terminates_without_revisits() {
        let (mut graph, ids) = line(5);
        graph
            .connect(ids[4], ids[0], "loop", "loop", false, false)
            .unwrap();
        let extra = graph.add_location("island", "", Vec::new());

        let search = graph.search_path(&[ids[0]], &[ids[2]], false);
        let path = search.path.unwrap();
        assert_eq!(path.len(), 3);
        assert_walkable(&graph, &path);

        let search = graph.search_path(&[ids[0]], &[extra], false);
        assert!(search.path.is_none());
        let unique = search.expanded.iter().collect::<BTreeSet<_>>();
        assert_eq!(unique.len(), search.expanded.len());
    }

    #[test]
    fn blocked_connections_are_ignored_unless_respected() {
        let (mut graph, ids) = line(3);
        let conn = graph.connection_between(ids[1], ids[2]).unwrap();
        graph.connection_mut(conn).unwrap().block("locked");
        assert!(graph.find_path(&[ids[0]], &[ids[2]], false).is_some());
        assert!(graph.find_path(&[ids[0]], &[ids[2]], true).is_none());
    }

    #[test]
    fn perception_reach_is_one_hop_and_flag_gated() {
        let mut graph = WorldGraph::new();
        let a = graph.add_location("a", "", Vec::new());
        let b = graph.add_location("b", "", Vec::new());
        let c = graph.add_location("c", "", Vec::new());
        graph.connect(a, b, "n", "s", true, false).unwrap();
        graph.connect(b, c, "n", "s", true, true).unwrap();

        assert_eq!(
            graph.perceivable_from(&[a], Cue::Visible),
            BTreeSet::from([a, b])
        );
        assert_eq!(graph.perceivable_from(&[a], Cue::Audible), BTreeSet::from([a]));
        assert_eq!(
            graph.perceivable_from(&[c], Cue::Audible),
            BTreeSet::from([b, c])
        );
    }
}
