//! Bounding-box spatial index over Cartesian-projected points.
//!
//! Each inserted point is stored as a tiny axis-aligned box so exact point
//! lookups survive floating-point noise. Radius queries test box intersection
//! against a cube of half-width `radius`, which makes them conservative: every
//! point within `radius` is returned, and so are some points in the cube's
//! corners. Callers that need an exact radius re-filter by distance.

use crate::geometry::SphericalCoordinate;

/// Half-width of the box stored around each inserted point.
pub const POINT_EPSILON: f64 = 1e-4;

/// Opaque key handed out by [`SpatialIndex::insert`].
pub type IndexKey = u64;

/// Axis-aligned box in Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: [f64; 3],
    /// Maximum corner
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Cube of the given half-width centred on a point.
    pub fn around(center: (f64, f64, f64), half_width: f64) -> Self {
        let (x, y, z) = center;
        Self {
            min: [x - half_width, y - half_width, z - half_width],
            max: [x + half_width, y + half_width, z + half_width],
        }
    }

    /// Whether two boxes overlap (touching edges count).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }
}

#[derive(Debug, Clone)]
struct IndexEntry<T> {
    key: IndexKey,
    bounds: BoundingBox,
    payload: T,
}

/// Point index answering conservative radius queries.
///
/// Not synchronized: the owner (a horizon) serializes access behind its own
/// lock so index and receptor list always change together.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    entries: Vec<IndexEntry<T>>,
    next_key: IndexKey,
}

impl<T> SpatialIndex<T> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_key: 0,
        }
    }

    /// Store a payload at a point and return its key.
    pub fn insert(&mut self, point: &SphericalCoordinate, payload: T) -> IndexKey {
        self.insert_cartesian(point.to_cartesian(), payload)
    }

    /// Store a payload at a Cartesian point and return its key.
    pub fn insert_cartesian(&mut self, point: (f64, f64, f64), payload: T) -> IndexKey {
        let key = self.next_key;
        self.next_key += 1;
        self.entries.push(IndexEntry {
            key,
            bounds: BoundingBox::around(point, POINT_EPSILON),
            payload,
        });
        key
    }

    /// Payloads whose box meets the cube of half-width `radius` around `center`.
    pub fn query_radius(&self, center: &SphericalCoordinate, radius: f64) -> Vec<&T> {
        self.query_cartesian(center.to_cartesian(), radius)
    }

    /// Same as [`query_radius`](Self::query_radius) for a Cartesian centre.
    ///
    /// Results come back in insertion order.
    pub fn query_cartesian(&self, center: (f64, f64, f64), radius: f64) -> Vec<&T> {
        let query = BoundingBox::around(center, radius.max(0.0));
        self.entries
            .iter()
            .filter(|entry| entry.bounds.intersects(&query))
            .map(|entry| &entry.payload)
            .collect()
    }

    /// Payload stored under a key.
    pub fn get(&self, key: IndexKey) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.payload)
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
