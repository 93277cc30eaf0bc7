//! Error types for geometry and horizon configuration.

/// Rejected coordinate input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Radius below zero
    #[error("Radius must be non-negative, got {0}")]
    NegativeRadius(f64),

    /// NaN or infinite component
    #[error("Coordinate component `{0}` is not finite")]
    NonFinite(&'static str),
}

/// Rejected receptor configuration.
///
/// These are configuration mistakes and are surfaced to whoever is setting up
/// the horizon; they never become runtime access decisions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReceptorError {
    /// Detection radius must be strictly positive
    #[error("Detection radius must be positive, got {0}")]
    NonPositiveRadius(f64),

    /// Data type label must be non-empty
    #[error("Data type must be specified")]
    EmptyDataType,

    /// Receptor placement could not be represented
    #[error("Invalid receptor coordinates: {0}")]
    InvalidCoordinates(#[from] GeometryError),
}
