//! Spatial primitives for CFIR entities
//!
//! An entity perceives data through a *horizon*: a centre point plus a set of
//! receptors, each with a detection radius and a data-type tag. This crate
//! provides the pieces needed to answer "is this location inside the entity's
//! sensing envelope, and which receptors could see it?":
//!
//! - [`SphericalCoordinate`]: validated, normalized spherical points with a
//!   cached Cartesian projection
//! - [`SpatialIndex`]: conservative bounding-box radius queries
//! - [`Receptor`]: a typed sensor with a bounded detection radius
//! - [`SpatialHorizon`]: the thread-safe envelope built from receptors
//!
//! # Example
//!
//! ```
//! use horizon::{SpatialHorizon, SphericalCoordinate};
//! use std::f64::consts::FRAC_PI_2;
//!
//! let horizon = SpatialHorizon::new(SphericalCoordinate::origin());
//! let placement = SphericalCoordinate::new(5.0, FRAC_PI_2, 0.0).unwrap();
//! horizon.add_receptor(placement, 5.0, "temperature").unwrap();
//!
//! let query = SphericalCoordinate::new(7.0, FRAC_PI_2, 0.0).unwrap();
//! assert!(horizon.contains_point(&query));
//! assert_eq!(horizon.nearby_receptors(&query, Some("temperature")).len(), 1);
//! ```

pub mod error;
pub mod geometry;
pub mod horizon;
pub mod index;
pub mod receptor;

// Re-export main types
pub use error::{GeometryError, ReceptorError};
pub use geometry::{SphericalCoordinate, COORD_EPSILON};
pub use horizon::SpatialHorizon;
pub use index::{BoundingBox, IndexKey, SpatialIndex, POINT_EPSILON};
pub use receptor::Receptor;
