//! The spatial horizon: an entity's sensing envelope.
//!
//! A horizon owns a centre point, an append-only list of receptors, and a
//! spatial index over them. Its maximum radius only ever grows.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::error::ReceptorError;
use crate::geometry::SphericalCoordinate;
use crate::index::SpatialIndex;
use crate::receptor::Receptor;

/// Receptor list, index and radius; always mutated together.
#[derive(Debug, Default)]
struct HorizonState {
    receptors: Vec<Receptor>,
    /// Maps index hits back to positions in `receptors`
    index: SpatialIndex<usize>,
    max_radius: f64,
}

/// Outer spatial boundary plus the receptors an entity perceives through.
#[derive(Debug)]
pub struct SpatialHorizon {
    center: SphericalCoordinate,
    state: Mutex<HorizonState>,
}

impl SpatialHorizon {
    /// Create an empty horizon around a centre point.
    pub fn new(center: SphericalCoordinate) -> Self {
        Self {
            center,
            state: Mutex::new(HorizonState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, HorizonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Centre of the horizon.
    pub fn center(&self) -> &SphericalCoordinate {
        &self.center
    }

    /// Validate and attach a receptor placed relative to the centre.
    ///
    /// Validation runs before anything is touched, so a rejected receptor
    /// leaves the horizon unchanged.
    pub fn add_receptor(
        &self,
        coordinates: SphericalCoordinate,
        detection_radius: f64,
        data_type: &str,
    ) -> Result<(), ReceptorError> {
        let receptor = Receptor::new(coordinates, detection_radius, data_type)?;
        self.insert_receptor(receptor);
        Ok(())
    }

    /// Attach an already validated receptor.
    pub fn insert_receptor(&self, receptor: Receptor) {
        let mut state = self.state();
        let position = state.receptors.len();
        state.index.insert(receptor.coordinates(), position);
        state.max_radius = state.max_radius.max(receptor.reach());

        info!(
            data_type = %receptor.data_type(),
            detection_radius = receptor.detection_radius(),
            coordinates = %receptor.coordinates(),
            max_radius = state.max_radius,
            "Added receptor"
        );

        state.receptors.push(receptor);
    }

    /// Current outer radius: the largest receptor reach, 0 when empty.
    pub fn max_radius(&self) -> f64 {
        self.state().max_radius
    }

    /// Whether a point lies inside the outer sensing boundary.
    ///
    /// This is a necessary filter only; it says nothing about which receptor,
    /// if any, covers the point.
    pub fn contains_point(&self, point: &SphericalCoordinate) -> bool {
        let max_radius = self.max_radius();
        let distance = self.center.distance_to(point);
        let allowed = distance <= max_radius;

        debug!(
            point = %point,
            distance = distance,
            max_radius = max_radius,
            allowed = allowed,
            "Spatial check"
        );

        allowed
    }

    /// Receptors that could detect a point, optionally restricted to a type.
    ///
    /// Uses the index's conservative box query with the full horizon radius;
    /// results are not re-filtered by exact distance. The lock is held for the
    /// whole query so a concurrent `add_receptor` cannot split the radius from
    /// the receptor list.
    pub fn nearby_receptors(
        &self,
        point: &SphericalCoordinate,
        data_type: Option<&str>,
    ) -> Vec<Receptor> {
        let (px, py, pz) = point.to_cartesian();
        let (cx, cy, cz) = self.center.to_cartesian();
        let relative = (px - cx, py - cy, pz - cz);

        let state = self.state();
        state
            .index
            .query_cartesian(relative, state.max_radius)
            .into_iter()
            .filter_map(|&position| state.receptors.get(position))
            .filter(|receptor| data_type.map_or(true, |wanted| receptor.data_type() == wanted))
            .cloned()
            .collect()
    }

    /// Snapshot of all receptors in insertion order.
    pub fn receptors(&self) -> Vec<Receptor> {
        self.state().receptors.clone()
    }

    /// Number of attached receptors.
    pub fn receptor_count(&self) -> usize {
        self.state().receptors.len()
    }
}
