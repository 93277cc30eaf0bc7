//! Receptors: localized sensors attached to a horizon.

use serde::Serialize;

use crate::error::ReceptorError;
use crate::geometry::SphericalCoordinate;

/// A sensor with a bounded detection radius and a data-type tag.
///
/// Coordinates are relative to the centre of the horizon that owns the
/// receptor. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receptor {
    coordinates: SphericalCoordinate,
    detection_radius: f64,
    data_type: String,
}

impl Receptor {
    /// Validate and build a receptor.
    pub fn new(
        coordinates: SphericalCoordinate,
        detection_radius: f64,
        data_type: impl Into<String>,
    ) -> Result<Self, ReceptorError> {
        if !detection_radius.is_finite() || detection_radius <= 0.0 {
            return Err(ReceptorError::NonPositiveRadius(detection_radius));
        }

        let data_type = data_type.into();
        if data_type.trim().is_empty() {
            return Err(ReceptorError::EmptyDataType);
        }

        Ok(Self {
            coordinates,
            detection_radius,
            data_type,
        })
    }

    /// Placement relative to the horizon centre.
    pub fn coordinates(&self) -> &SphericalCoordinate {
        &self.coordinates
    }

    /// Detection radius (always positive).
    pub fn detection_radius(&self) -> f64 {
        self.detection_radius
    }

    /// Data-type label.
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Furthest distance from the horizon centre this receptor can sense.
    pub fn reach(&self) -> f64 {
        self.coordinates.r() + self.detection_radius
    }
}
