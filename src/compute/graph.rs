//! Waypoint graph: positions plus an undirected adjacency set.
//!
//! The graph is built once per search and shared read-only by every
//! evolutionary operator. Links are kept symmetric, deduplicated, sorted and
//! free of self-loops, so iteration order (and therefore seeded search output)
//! is deterministic.

use std::collections::BTreeMap;

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::schema::{Point3, Waypoint, WaypointId};

use super::visibility::Visibility;

/// Graph construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Waypoint {0} is defined more than once")]
    DuplicateWaypoint(WaypointId),
    #[error("Link references unknown waypoint {0}")]
    UnknownWaypoint(WaypointId),
}

/// Waypoint positions and the links between them.
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    positions: BTreeMap<WaypointId, Point3>,
    links: BTreeMap<WaypointId, Vec<WaypointId>>,
    ids: Vec<WaypointId>,
}

impl NavGraph {
    /// Create a graph with the given waypoints and no links.
    pub fn new(waypoints: &[Waypoint]) -> Result<Self, GraphError> {
        let mut positions = BTreeMap::new();
        for waypoint in waypoints {
            if positions.insert(waypoint.id, waypoint.position).is_some() {
                return Err(GraphError::DuplicateWaypoint(waypoint.id));
            }
        }
        let ids = positions.keys().copied().collect();

        Ok(Self {
            positions,
            links: BTreeMap::new(),
            ids,
        })
    }

    /// Create a graph from an explicit link list.
    pub fn from_links(
        waypoints: &[Waypoint],
        links: &[(WaypointId, WaypointId)],
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(waypoints)?;
        for &(a, b) in links {
            graph.add_link(a, b)?;
        }
        Ok(graph)
    }

    /// Add an undirected link. Returns `false` for self-loops and existing links.
    pub fn add_link(&mut self, a: WaypointId, b: WaypointId) -> Result<bool, GraphError> {
        for id in [a, b] {
            if !self.positions.contains_key(&id) {
                return Err(GraphError::UnknownWaypoint(id));
            }
        }
        if a == b {
            return Ok(false);
        }

        let inserted = insert_sorted(self.links.entry(a).or_default(), b);
        insert_sorted(self.links.entry(b).or_default(), a);
        Ok(inserted)
    }

    /// Whether the waypoint exists in the graph.
    #[inline]
    pub fn contains(&self, id: WaypointId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Position of a waypoint.
    #[inline]
    pub fn position(&self, id: WaypointId) -> Option<&Point3> {
        self.positions.get(&id)
    }

    /// Sorted neighbors of a waypoint (empty when unknown or isolated).
    #[inline]
    pub fn neighbors(&self, id: WaypointId) -> &[WaypointId] {
        self.links.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `a` and `b` are directly linked.
    #[inline]
    pub fn is_linked(&self, a: WaypointId, b: WaypointId) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// All waypoint ids in ascending order.
    #[inline]
    pub fn waypoint_ids(&self) -> &[WaypointId] {
        &self.ids
    }

    /// Euclidean distance between two waypoints.
    pub fn distance(&self, a: WaypointId, b: WaypointId) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the graph has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of undirected links.
    pub fn link_count(&self) -> usize {
        self.links.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Undirected link list with `a < b`.
    pub fn edges(&self) -> Vec<(WaypointId, WaypointId)> {
        let mut edges = Vec::with_capacity(self.link_count());
        for (&a, neighbors) in &self.links {
            for &b in neighbors {
                if a < b {
                    edges.push((a, b));
                }
            }
        }
        edges
    }
}

fn insert_sorted(list: &mut Vec<WaypointId>, id: WaypointId) -> bool {
    match list.binary_search(&id) {
        Ok(_) => false,
        Err(pos) => {
            list.insert(pos, id);
            true
        }
    }
}

/// Build the graph by linking every pair of waypoints with a clear line of sight.
pub fn build_graph<V>(waypoints: &[Waypoint], visibility: &V) -> Result<NavGraph, GraphError>
where
    V: Visibility + Sync,
{
    let mut graph = NavGraph::new(waypoints)?;

    for (a, b) in visible_pairs(waypoints, visibility) {
        log::debug!("Found valid link between {} and {}", a, b);
        graph.add_link(a, b)?;
    }

    log::info!(
        "Built waypoint graph: {} waypoints, {} links",
        graph.len(),
        graph.link_count()
    );
    Ok(graph)
}

/// Pairwise visibility tests (parallel on native targets).
#[cfg(not(target_arch = "wasm32"))]
fn visible_pairs<V>(waypoints: &[Waypoint], visibility: &V) -> Vec<(WaypointId, WaypointId)>
where
    V: Visibility + Sync,
{
    (0..waypoints.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = &waypoints[i];
            waypoints[i + 1..].iter().filter_map(move |b| {
                if visibility.is_blocked(&a.position, &b.position) {
                    log::trace!("Link between {} and {} is blocked", a.id, b.id);
                    None
                } else {
                    Some((a.id, b.id))
                }
            })
        })
        .collect()
}

#[cfg(target_arch = "wasm32")]
fn visible_pairs<V>(waypoints: &[Waypoint], visibility: &V) -> Vec<(WaypointId, WaypointId)>
where
    V: Visibility + Sync,
{
    let mut pairs = Vec::new();
    for (i, a) in waypoints.iter().enumerate() {
        for b in &waypoints[i + 1..] {
            if !visibility.is_blocked(&a.position, &b.position) {
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::LineOfSight;
    use crate::schema::{Obstacle, Scenario};

    fn line() -> Vec<Waypoint> {
        (0..4)
            .map(|i| Waypoint::new(i, [i as f32, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn test_links_are_symmetric_and_deduplicated() {
        let graph = NavGraph::from_links(&line(), &[(0, 1), (1, 0), (1, 2), (2, 2)]).unwrap();
        assert!(graph.is_linked(0, 1));
        assert!(graph.is_linked(1, 0));
        assert!(!graph.is_linked(2, 2));
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.edges(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_unknown_and_duplicate_waypoints() {
        assert_eq!(
            NavGraph::from_links(&line(), &[(0, 9)]).unwrap_err(),
            GraphError::UnknownWaypoint(9)
        );

        let mut waypoints = line();
        waypoints.push(Waypoint::new(2, [5.0, 5.0, 5.0]));
        assert_eq!(
            NavGraph::new(&waypoints).unwrap_err(),
            GraphError::DuplicateWaypoint(2)
        );
    }

    #[test]
    fn test_isolated_waypoint() {
        let graph = NavGraph::new(&line()).unwrap();
        assert!(graph.contains(3));
        assert!(graph.neighbors(3).is_empty());
        assert!(graph.neighbors(42).is_empty());
        assert_eq!(graph.distance(0, 3), Some(3.0));
        assert_eq!(graph.distance(0, 42), None);
    }

    #[test]
    fn test_build_graph_unobstructed_is_complete() {
        let graph = build_graph(&line(), &|_: &Point3, _: &Point3| false).unwrap();
        assert_eq!(graph.link_count(), 6);
        assert_eq!(graph.waypoint_ids(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_build_graph_with_obstacle() {
        let waypoints = vec![
            Waypoint::new(0, [0.0, 0.0, 0.0]),
            Waypoint::new(1, [10.0, 0.0, 0.0]),
            Waypoint::new(2, [5.0, 5.0, 0.0]),
        ];
        let obstacles = vec![Obstacle::Sphere {
            center: Point3::new(5.0, 0.0, 0.0),
            radius: 1.0,
        }];
        let graph = build_graph(&waypoints, &LineOfSight::new(&obstacles)).unwrap();
        assert!(!graph.is_linked(0, 1));
        assert!(graph.is_linked(0, 2));
        assert!(graph.is_linked(2, 1));
    }

    #[test]
    fn test_default_scenario_forces_detour() {
        let scenario = Scenario::default();
        let graph =
            build_graph(&scenario.waypoints, &LineOfSight::new(&scenario.obstacles)).unwrap();
        assert!(!graph.is_linked(scenario.start, scenario.goal));
        assert!(graph.is_linked(0, 3));
        assert!(graph.is_linked(3, 6));
    }
}
