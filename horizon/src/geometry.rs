//! Spherical coordinates and their Cartesian projection.
//!
//! Every containment and index query goes through the Cartesian projection,
//! so it is computed once when a coordinate is built and carried with the
//! value from then on.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::error::GeometryError;

/// Tolerance for comparing derived or cached coordinates.
pub const COORD_EPSILON: f64 = 1e-10;

/// An immutable point in spherical coordinates.
///
/// Invariants: `r >= 0`, `theta` in `[0, π]`, `phi` in `[0, 2π)`. At the
/// origin both angles are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct SphericalCoordinate {
    r: f64,
    theta: f64,
    phi: f64,
    cartesian: (f64, f64, f64),
}

/// Wire shape of a coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCoordinate {
    r: f64,
    theta: f64,
    phi: f64,
}

impl SphericalCoordinate {
    /// Build a coordinate, normalizing the angles into range.
    ///
    /// A polar angle outside `[0, π]` is reflected through the pole (which
    /// rotates the azimuth by π); the azimuth is then wrapped into `[0, 2π)`.
    /// Negative or non-finite radii are rejected, never coerced.
    pub fn new(r: f64, theta: f64, phi: f64) -> Result<Self, GeometryError> {
        if !r.is_finite() {
            return Err(GeometryError::NonFinite("r"));
        }
        if !theta.is_finite() {
            return Err(GeometryError::NonFinite("theta"));
        }
        if !phi.is_finite() {
            return Err(GeometryError::NonFinite("phi"));
        }
        if r < 0.0 {
            return Err(GeometryError::NegativeRadius(r));
        }
        if r == 0.0 {
            return Ok(Self::origin());
        }

        let (theta, phi) = normalize_angles(theta, phi);
        Ok(Self::from_parts(r, theta, phi))
    }

    /// The origin, `(0, 0, 0)`.
    pub fn origin() -> Self {
        Self {
            r: 0.0,
            theta: 0.0,
            phi: 0.0,
            cartesian: (0.0, 0.0, 0.0),
        }
    }

    /// Build from Cartesian components.
    ///
    /// The origin maps to `(0, 0, 0)` so no angle is ever derived from a
    /// zero-length vector.
    pub fn from_cartesian(x: f64, y: f64, z: f64) -> Result<Self, GeometryError> {
        if !x.is_finite() {
            return Err(GeometryError::NonFinite("x"));
        }
        if !y.is_finite() {
            return Err(GeometryError::NonFinite("y"));
        }
        if !z.is_finite() {
            return Err(GeometryError::NonFinite("z"));
        }

        let r = (x * x + y * y + z * z).sqrt();
        if !r.is_finite() {
            return Err(GeometryError::NonFinite("r"));
        }
        if r == 0.0 {
            return Ok(Self::origin());
        }

        let theta = x.hypot(y).atan2(z);
        let phi = wrap_azimuth(y.atan2(x));
        Ok(Self::from_parts(r, theta, phi))
    }

    fn from_parts(r: f64, theta: f64, phi: f64) -> Self {
        let x = r * theta.sin() * phi.cos();
        let y = r * theta.sin() * phi.sin();
        let z = r * theta.cos();
        Self {
            r,
            theta,
            phi,
            cartesian: (x, y, z),
        }
    }

    /// Distance from the origin.
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Polar angle in `[0, π]`.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Azimuthal angle in `[0, 2π)`.
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Cartesian projection `(x, y, z)`.
    pub fn to_cartesian(&self) -> (f64, f64, f64) {
        self.cartesian
    }

    /// Euclidean distance to another coordinate.
    pub fn distance_to(&self, other: &SphericalCoordinate) -> f64 {
        let (x1, y1, z1) = self.cartesian;
        let (x2, y2, z2) = other.cartesian;
        ((x2 - x1).powi(2) + (y2 - y1).powi(2) + (z2 - z1).powi(2)).sqrt()
    }

    /// Component-wise comparison within [`COORD_EPSILON`].
    pub fn approx_eq(&self, other: &SphericalCoordinate) -> bool {
        (self.r - other.r).abs() < COORD_EPSILON
            && (self.theta - other.theta).abs() < COORD_EPSILON
            && (self.phi - other.phi).abs() < COORD_EPSILON
    }
}

impl TryFrom<RawCoordinate> for SphericalCoordinate {
    type Error = GeometryError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.r, raw.theta, raw.phi)
    }
}

impl From<SphericalCoordinate> for RawCoordinate {
    fn from(coord: SphericalCoordinate) -> Self {
        Self {
            r: coord.r,
            theta: coord.theta,
            phi: coord.phi,
        }
    }
}

impl std::fmt::Display for SphericalCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(r={:.4}, θ={:.4}, φ={:.4})",
            self.r, self.theta, self.phi
        )
    }
}

fn normalize_angles(theta: f64, phi: f64) -> (f64, f64) {
    let mut theta = theta.rem_euclid(TAU);
    let mut phi = phi;
    if theta > PI {
        theta = TAU - theta;
        phi += PI;
    }
    (theta, wrap_azimuth(phi))
}

fn wrap_azimuth(phi: f64) -> f64 {
    let wrapped = phi.rem_euclid(TAU);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_negative_radius_rejected() {
        assert_eq!(
            SphericalCoordinate::new(-1.0, 0.0, 0.0),
            Err(GeometryError::NegativeRadius(-1.0))
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(SphericalCoordinate::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(SphericalCoordinate::new(1.0, f64::INFINITY, 0.0).is_err());
        assert!(SphericalCoordinate::from_cartesian(0.0, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_origin_normalizes_angles() {
        let origin = SphericalCoordinate::new(0.0, 1.2, 3.4).unwrap();
        assert_eq!(origin, SphericalCoordinate::origin());

        let from_cart = SphericalCoordinate::from_cartesian(0.0, 0.0, 0.0).unwrap();
        assert_eq!(from_cart.r(), 0.0);
        assert_eq!(from_cart.theta(), 0.0);
        assert_eq!(from_cart.phi(), 0.0);
    }

    #[test]
    fn test_azimuth_wraps() {
        let coord = SphericalCoordinate::new(1.0, 1.0, TAU + 0.5).unwrap();
        assert!((coord.phi() - 0.5).abs() < COORD_EPSILON);

        let negative = SphericalCoordinate::new(1.0, 1.0, -0.5).unwrap();
        assert!((negative.phi() - (TAU - 0.5)).abs() < COORD_EPSILON);
    }

    #[test]
    fn test_polar_angle_reflects_through_pole() {
        // θ = 3π/2 points the same way as θ = π/2 rotated half a turn
        let reflected = SphericalCoordinate::new(2.0, 1.5 * PI, 0.0).unwrap();
        assert!((reflected.theta() - FRAC_PI_2).abs() < COORD_EPSILON);
        assert!((reflected.phi() - PI).abs() < COORD_EPSILON);

        let (x, y, z) = reflected.to_cartesian();
        assert!((x + 2.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!(z.abs() < 1e-9);
    }

    #[test]
    fn test_pole_is_kept() {
        let south = SphericalCoordinate::new(1.0, PI, 0.0).unwrap();
        assert_eq!(south.theta(), PI);
    }

    #[test]
    fn test_distance() {
        let a = SphericalCoordinate::new(5.0, FRAC_PI_2, 0.0).unwrap();
        let b = SphericalCoordinate::new(5.0, FRAC_PI_2, PI).unwrap();
        assert!((a.distance_to(&b) - 10.0).abs() < 1e-9);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_approx_eq() {
        let a = SphericalCoordinate::new(1.0, 1.0, 1.0).unwrap();
        let b = SphericalCoordinate::new(1.0 + 1e-12, 1.0, 1.0).unwrap();
        let c = SphericalCoordinate::new(1.0 + 1e-6, 1.0, 1.0).unwrap();
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&c));
    }

    #[test]
    fn test_serde_uses_spherical_fields() {
        let coord = SphericalCoordinate::new(3.0, 1.0, 2.0).unwrap();
        let json = serde_json::to_value(coord).unwrap();
        assert_eq!(json, serde_json::json!({"r": 3.0, "theta": 1.0, "phi": 2.0}));

        let parsed: SphericalCoordinate = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, coord);

        let invalid = serde_json::json!({"r": -3.0, "theta": 1.0, "phi": 2.0});
        assert!(serde_json::from_value::<SphericalCoordinate>(invalid).is_err());
    }

    proptest! {
        #[test]
        fn prop_cartesian_roundtrip(
            r in 1e-3f64..1e3,
            theta in 1e-3f64..(PI - 1e-3),
            phi in 0.0f64..(TAU - 1e-3),
        ) {
            let original = SphericalCoordinate::new(r, theta, phi).unwrap();
            let (x, y, z) = original.to_cartesian();
            let back = SphericalCoordinate::from_cartesian(x, y, z).unwrap();

            prop_assert!((back.r() - r).abs() < 1e-9);
            prop_assert!((back.theta() - theta).abs() < 1e-9);
            prop_assert!((back.phi() - phi).abs() < 1e-9);
        }

        #[test]
        fn prop_angles_always_in_range(
            r in 0.0f64..1e3,
            theta in -20.0f64..20.0,
            phi in -20.0f64..20.0,
        ) {
            let coord = SphericalCoordinate::new(r, theta, phi).unwrap();
            prop_assert!(coord.theta() >= 0.0 && coord.theta() <= PI);
            prop_assert!(coord.phi() >= 0.0 && coord.phi() < TAU);
        }
    }
}
