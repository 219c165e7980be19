//! Line-of-sight tests used to derive waypoint links.
//!
//! The graph builder only sees the [`Visibility`] trait, so hosts can plug in
//! their own collision queries. [`LineOfSight`] is the built-in implementation
//! for sphere and box obstacles.

use crate::schema::{Obstacle, Point3};

/// Decides whether the straight segment between two positions is obstructed.
pub trait Visibility {
    fn is_blocked(&self, from: &Point3, to: &Point3) -> bool;
}

impl<F> Visibility for F
where
    F: Fn(&Point3, &Point3) -> bool,
{
    #[inline]
    fn is_blocked(&self, from: &Point3, to: &Point3) -> bool {
        self(from, to)
    }
}

/// Obstacle-based visibility with an optional clearance margin.
#[derive(Debug, Clone, Copy)]
pub struct LineOfSight<'a> {
    obstacles: &'a [Obstacle],
    clearance: f32,
}

impl<'a> LineOfSight<'a> {
    /// Test against `obstacles` with no clearance.
    pub fn new(obstacles: &'a [Obstacle]) -> Self {
        Self {
            obstacles,
            clearance: 0.0,
        }
    }

    /// Inflate every obstacle by `clearance` (e.g. an agent radius).
    pub fn with_clearance(mut self, clearance: f32) -> Self {
        self.clearance = clearance.max(0.0);
        self
    }
}

impl Visibility for LineOfSight<'_> {
    fn is_blocked(&self, from: &Point3, to: &Point3) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.intersects_segment(from, to, self.clearance))
    }
}

impl Obstacle {
    /// Whether the segment `a`-`b` touches this obstacle grown by `margin`.
    pub fn intersects_segment(&self, a: &Point3, b: &Point3, margin: f32) -> bool {
        match self {
            Obstacle::Sphere { center, radius } => {
                segment_hits_sphere(a, b, center, radius + margin)
            }
            Obstacle::Box { min, max } => {
                let lo = Point3::new(
                    min.x.min(max.x) - margin,
                    min.y.min(max.y) - margin,
                    min.z.min(max.z) - margin,
                );
                let hi = Point3::new(
                    min.x.max(max.x) + margin,
                    min.y.max(max.y) + margin,
                    min.z.max(max.z) + margin,
                );
                segment_hits_box(a, b, &lo, &hi)
            }
        }
    }
}

/// Closest-point test between a segment and a sphere.
fn segment_hits_sphere(a: &Point3, b: &Point3, center: &Point3, radius: f32) -> bool {
    let ab = b.sub(a);
    let len_sq = ab.dot(&ab);
    let t = if len_sq > 0.0 {
        (center.sub(a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = Point3::new(a.x + ab.x * t, a.y + ab.y * t, a.z + ab.z * t);
    closest.distance_squared(center) <= radius * radius
}

/// Slab test between a segment and an axis-aligned box.
fn segment_hits_box(a: &Point3, b: &Point3, lo: &Point3, hi: &Point3) -> bool {
    let dir = b.sub(a);
    let mut t_min = 0.0f32;
    let mut t_max = 1.0f32;

    for axis in 0..3 {
        let origin = a.axis(axis);
        let d = dir.axis(axis);
        let (slab_lo, slab_hi) = (lo.axis(axis), hi.axis(axis));

        if d.abs() < f32::EPSILON {
            // Parallel to this slab
            if origin < slab_lo || origin > slab_hi {
                return false;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (slab_lo - origin) * inv;
        let mut t1 = (slab_hi - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return false;
        }
    }

    true
}
