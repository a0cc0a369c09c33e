//! # Overworld Graph
//!
//! The node/edge structure of travel options between play areas, and the
//! travel state machine the world layer drives.
//!
//! Nodes are identified by their grid coordinate. The node set and edge set
//! are fixed once generation finishes; only the per-node flags and the
//! current/destination cursor change as the player travels.

use crate::utils::{hop_distances, is_connected};
use crate::{DeepwildError, DeepwildResult, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Enemy family populating an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyType {
    Mob,
    GiantLizard,
}

impl EnemyType {
    /// The fixed set cycled over when nodes are created.
    pub const ROTATION: [EnemyType; 2] = [EnemyType::Mob, EnemyType::GiantLizard];

    /// Enemy type of the `index`-th accepted node.
    pub fn for_index(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyType::Mob => "Mob",
            EnemyType::GiantLizard => "Giant Lizard",
        }
    }
}

/// Per-node attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    pub discovered: bool,
    pub visited: bool,
    pub is_goal: bool,
    pub enemy_type: EnemyType,
}

impl NodeAttrs {
    pub fn new(enemy_type: EnemyType) -> Self {
        Self {
            discovered: false,
            visited: false,
            is_goal: false,
            enemy_type,
        }
    }
}

/// Undirected edge; `a` is always the smaller endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverworldEdge {
    pub a: Position,
    pub b: Position,
    pub weight: f64,
}

impl OverworldEdge {
    /// Creates an edge weighted by the Euclidean distance of its endpoints.
    pub fn between(first: Position, second: Position) -> Self {
        let (a, b) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            a,
            b,
            weight: a.euclidean_distance(b),
        }
    }
}

#[derive(Serialize)]
struct NodeRecord {
    position: Position,
    #[serde(flatten)]
    attrs: NodeAttrs,
    current: bool,
}

#[derive(Serialize)]
struct GraphRecord {
    nodes: Vec<NodeRecord>,
    edges: Vec<OverworldEdge>,
    destination: Option<Position>,
}

/// A connected undirected graph of overworld nodes plus travel state.
#[derive(Debug, Clone, PartialEq)]
pub struct OverworldGraph {
    order: Vec<Position>,
    attrs: BTreeMap<Position, NodeAttrs>,
    adjacency: BTreeMap<Position, BTreeSet<Position>>,
    current_node: Position,
    destination: Option<Position>,
}

impl OverworldGraph {
    /// Builds a graph from nodes (in creation order) and edges.
    ///
    /// The current node starts at the first node; generation moves it with
    /// [`OverworldGraph::start_at`]. Edges naming unknown nodes are rejected.
    pub fn from_parts(
        nodes: Vec<(Position, NodeAttrs)>,
        edges: impl IntoIterator<Item = (Position, Position)>,
    ) -> DeepwildResult<Self> {
        let current_node = nodes
            .first()
            .map(|(pos, _)| *pos)
            .ok_or_else(|| DeepwildError::InvalidState("Overworld has no nodes".to_string()))?;

        let order: Vec<Position> = nodes.iter().map(|(pos, _)| *pos).collect();
        let attrs: BTreeMap<Position, NodeAttrs> = nodes.into_iter().collect();
        if attrs.len() != order.len() {
            return Err(DeepwildError::InvalidState(
                "Overworld node coordinates must be unique".to_string(),
            ));
        }

        let mut adjacency: BTreeMap<Position, BTreeSet<Position>> =
            order.iter().map(|pos| (*pos, BTreeSet::new())).collect();
        for (a, b) in edges {
            if a == b || !attrs.contains_key(&a) || !attrs.contains_key(&b) {
                return Err(DeepwildError::InvalidState(format!(
                    "Edge {} - {} does not join two distinct nodes",
                    a, b
                )));
            }
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }

        Ok(Self {
            order,
            attrs,
            adjacency,
            current_node,
            destination: None,
        })
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = Position> + '_ {
        self.order.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, node: Position) -> bool {
        self.attrs.contains_key(&node)
    }

    pub fn neighbors(&self, node: Position) -> impl Iterator<Item = Position> + '_ {
        self.adjacency.get(&node).into_iter().flatten().copied()
    }

    pub fn are_adjacent(&self, a: Position, b: Position) -> bool {
        self.adjacency.get(&a).is_some_and(|set| set.contains(&b))
    }

    pub fn degree(&self, node: Position) -> usize {
        self.adjacency.get(&node).map_or(0, BTreeSet::len)
    }

    pub fn node_attr(&self, node: Position) -> Option<&NodeAttrs> {
        self.attrs.get(&node)
    }

    /// Every edge once, ordered by endpoints.
    pub fn edges(&self) -> Vec<OverworldEdge> {
        self.adjacency
            .iter()
            .flat_map(|(a, set)| {
                set.iter()
                    .filter(move |b| a < *b)
                    .map(move |b| OverworldEdge::between(*a, *b))
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Checks that a path exists between every pair of nodes.
    pub fn is_connected(&self) -> bool {
        is_connected(&self.order, |node| {
            self.neighbors(*node).collect::<Vec<_>>()
        })
    }

    /// Hop counts from `start` to every reachable node.
    pub fn hop_distances(&self, start: Position) -> BTreeMap<Position, usize> {
        hop_distances(&start, |node| self.neighbors(*node).collect::<Vec<_>>())
            .into_iter()
            .collect()
    }

    pub fn current_node(&self) -> Position {
        self.current_node
    }

    pub fn destination(&self) -> Option<Position> {
        self.destination
    }

    fn attrs_mut(&mut self, node: Position) -> DeepwildResult<&mut NodeAttrs> {
        self.attrs
            .get_mut(&node)
            .ok_or_else(|| DeepwildError::InvalidTravel(format!("Unknown node {}", node)))
    }

    /// Marks a node discovered, optionally with all of its neighbours.
    pub fn discover_node(&mut self, node: Position, with_neighbors: bool) -> DeepwildResult<()> {
        self.attrs_mut(node)?.discovered = true;
        if with_neighbors {
            let neighbors: Vec<Position> = self.neighbors(node).collect();
            for neighbor in neighbors {
                self.attrs_mut(neighbor)?.discovered = true;
            }
        }
        Ok(())
    }

    pub fn visit_node(&mut self, node: Position) -> DeepwildResult<()> {
        self.attrs_mut(node)?.visited = true;
        Ok(())
    }

    /// Flags `node` as the goal. Goal selection itself belongs to the caller.
    pub fn set_goal(&mut self, node: Position) -> DeepwildResult<()> {
        self.attrs_mut(node)?.is_goal = true;
        Ok(())
    }

    pub fn goal(&self) -> Option<Position> {
        self.order
            .iter()
            .copied()
            .find(|node| self.attrs.get(node).is_some_and(|attrs| attrs.is_goal))
    }

    /// Places the traveller on `node`: it and its neighbours become
    /// discovered and it becomes visited.
    pub fn start_at(&mut self, node: Position) -> DeepwildResult<()> {
        if !self.contains(node) {
            return Err(DeepwildError::InvalidTravel(format!("Unknown node {}", node)));
        }
        self.current_node = node;
        self.destination = None;
        self.discover_node(node, true)?;
        self.visit_node(node)
    }

    /// Sets the pending destination. It must neighbour the current node.
    pub fn set_destination(&mut self, node: Position) -> DeepwildResult<()> {
        if !self.are_adjacent(self.current_node, node) {
            return Err(DeepwildError::InvalidTravel(format!(
                "{} is not adjacent to current node {}",
                node, self.current_node
            )));
        }
        self.destination = Some(node);
        Ok(())
    }

    /// Moves to the pending destination and returns the new current node.
    pub fn commit_travel(&mut self) -> DeepwildResult<Position> {
        let destination = self
            .destination
            .ok_or_else(|| DeepwildError::InvalidTravel("No destination set".to_string()))?;
        self.start_at(destination)?;
        Ok(destination)
    }

    /// The neighbour of the current node closest to a point in grid units.
    ///
    /// Ties go to the smaller coordinate. `None` only for an isolated node.
    pub fn closest_neighbor(&self, x: f64, y: f64) -> Option<Position> {
        self.neighbors(self.current_node).fold(None, |best, node| {
            let distance = ((node.x as f64 - x).powi(2) + (node.y as f64 - y).powi(2)).sqrt();
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((node, distance)),
            }
        })
        .map(|(node, _)| node)
    }

    /// Serialises nodes, edges and travel state as pretty JSON.
    pub fn export_json(&self) -> DeepwildResult<String> {
        let record = GraphRecord {
            nodes: self
                .order
                .iter()
                .filter_map(|pos| {
                    self.attrs.get(pos).map(|attrs| NodeRecord {
                        position: *pos,
                        attrs: *attrs,
                        current: *pos == self.current_node,
                    })
                })
                .collect(),
            edges: self.edges(),
            destination: self.destination,
        };
        serde_json::to_string_pretty(&record).map_err(DeepwildError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a - b - c, plus an isolated-looking spur d hanging off c.
    fn line_graph() -> OverworldGraph {
        let nodes = vec![
            (Position::new(1, 1), NodeAttrs::new(EnemyType::Mob)),
            (Position::new(5, 1), NodeAttrs::new(EnemyType::GiantLizard)),
            (Position::new(9, 1), NodeAttrs::new(EnemyType::Mob)),
            (Position::new(9, 5), NodeAttrs::new(EnemyType::GiantLizard)),
        ];
        let edges = vec![
            (Position::new(1, 1), Position::new(5, 1)),
            (Position::new(5, 1), Position::new(9, 1)),
            (Position::new(9, 1), Position::new(9, 5)),
        ];
        OverworldGraph::from_parts(nodes, edges).unwrap()
    }

    #[test]
    fn test_enemy_type_rotation() {
        assert_eq!(EnemyType::for_index(0), EnemyType::Mob);
        assert_eq!(EnemyType::for_index(1), EnemyType::GiantLizard);
        assert_eq!(EnemyType::for_index(2), EnemyType::Mob);
    }

    #[test]
    fn test_edges_and_degrees() {
        let graph = line_graph();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.degree(Position::new(5, 1)), 2);
        assert_eq!(graph.degree(Position::new(1, 1)), 1);
        let edges = graph.edges();
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|edge| edge.a < edge.b));
        assert_eq!(edges[0].weight, 4.0);
        assert!(graph.is_connected());
    }

    #[test]
    fn test_rejects_unknown_edge_endpoints() {
        let nodes = vec![(Position::new(1, 1), NodeAttrs::new(EnemyType::Mob))];
        let result = OverworldGraph::from_parts(nodes, vec![(Position::new(1, 1), Position::new(2, 2))]);
        assert!(matches!(result, Err(DeepwildError::InvalidState(_))));
    }

    #[test]
    fn test_start_discovers_neighbors_and_visits_only_current() {
        let mut graph = line_graph();
        graph.start_at(Position::new(5, 1)).unwrap();

        let current = graph.node_attr(Position::new(5, 1)).unwrap();
        assert!(current.discovered && current.visited);
        let neighbor = graph.node_attr(Position::new(1, 1)).unwrap();
        assert!(neighbor.discovered && !neighbor.visited);
        let far = graph.node_attr(Position::new(9, 5)).unwrap();
        assert!(!far.discovered);
    }

    #[test]
    fn test_travel_state_machine() {
        let mut graph = line_graph();
        graph.start_at(Position::new(1, 1)).unwrap();

        assert!(matches!(graph.commit_travel(), Err(DeepwildError::InvalidTravel(_))));
        assert!(graph.set_destination(Position::new(9, 1)).is_err());

        graph.set_destination(Position::new(5, 1)).unwrap();
        assert_eq!(graph.commit_travel().unwrap(), Position::new(5, 1));
        assert_eq!(graph.current_node(), Position::new(5, 1));
        assert_eq!(graph.destination(), None);
        assert!(graph.node_attr(Position::new(9, 1)).unwrap().discovered);
        assert!(graph.node_attr(Position::new(5, 1)).unwrap().visited);
    }

    #[test]
    fn test_closest_neighbor_picks_nearest_adjacent_node() {
        let mut graph = line_graph();
        graph.start_at(Position::new(5, 1)).unwrap();
        assert_eq!(graph.closest_neighbor(8.0, 2.0), Some(Position::new(9, 1)));
        assert_eq!(graph.closest_neighbor(0.0, 0.0), Some(Position::new(1, 1)));
        // The spur is not adjacent to the current node.
        assert_ne!(graph.closest_neighbor(9.0, 5.0), Some(Position::new(9, 5)));
    }

    #[test]
    fn test_hop_distances_and_goal() {
        let mut graph = line_graph();
        let hops = graph.hop_distances(Position::new(1, 1));
        assert_eq!(hops[&Position::new(9, 5)], 3);
        assert_eq!(graph.goal(), None);
        graph.set_goal(Position::new(9, 5)).unwrap();
        assert_eq!(graph.goal(), Some(Position::new(9, 5)));
    }

    #[test]
    fn test_export_json_lists_everything() {
        let mut graph = line_graph();
        graph.start_at(Position::new(1, 1)).unwrap();
        let json = graph.export_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(value["edges"].as_array().unwrap().len(), 3);
        assert_eq!(value["nodes"][0]["current"], true);
        assert_eq!(value["nodes"][1]["enemy_type"], "GiantLizard");
    }
}
