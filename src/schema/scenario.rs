//! World description types: waypoints, obstacles and search scenarios.

use serde::{Deserialize, Serialize};

use super::SearchConfig;

/// Waypoint identifier (integer index).
pub type WaypointId = usize;

/// A position in 3D world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point3) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    pub(crate) fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    #[inline]
    pub(crate) fn dot(&self, other: &Point3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub(crate) fn axis(&self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl From<[f32; 3]> for Point3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// A discrete location usable as a path vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Identifier, unique within a scenario.
    pub id: WaypointId,
    /// World position.
    pub position: Point3,
}

impl Waypoint {
    pub fn new(id: WaypointId, position: impl Into<Point3>) -> Self {
        Self {
            id,
            position: position.into(),
        }
    }
}

/// Geometry that blocks line of sight between waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Obstacle {
    /// Solid sphere.
    Sphere { center: Point3, radius: f32 },
    /// Axis-aligned box given by its two opposite corners.
    Box { min: Point3, max: Point3 },
}

/// A complete search problem, as loaded by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Waypoints available to the search.
    pub waypoints: Vec<Waypoint>,
    /// Obstacles used to derive the adjacency graph.
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Fixed start waypoint.
    pub start: WaypointId,
    /// Fixed goal waypoint.
    pub goal: WaypointId,
    /// Search settings.
    #[serde(default)]
    pub config: SearchConfig,
}

impl Default for Scenario {
    /// A room split by a wall with a single gap off the straight line.
    fn default() -> Self {
        let waypoints = vec![
            Waypoint::new(0, [0.0, 0.0, 0.0]),
            Waypoint::new(1, [4.0, 0.0, 3.0]),
            Waypoint::new(2, [4.0, 0.0, -3.0]),
            Waypoint::new(3, [5.0, 0.0, 1.75]),
            Waypoint::new(4, [6.0, 0.0, 3.0]),
            Waypoint::new(5, [6.0, 0.0, -3.0]),
            Waypoint::new(6, [10.0, 0.0, 0.0]),
        ];

        let obstacles = vec![
            Obstacle::Box {
                min: Point3::new(4.5, -1.0, 2.5),
                max: Point3::new(5.5, 1.0, 6.0),
            },
            Obstacle::Box {
                min: Point3::new(4.5, -1.0, -6.0),
                max: Point3::new(5.5, 1.0, 1.0),
            },
        ];

        Self {
            waypoints,
            obstacles,
            start: 0,
            goal: 6,
            config: SearchConfig {
                random_seed: Some(7),
                ..Default::default()
            },
        }
    }
}
