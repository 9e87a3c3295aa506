//! Geographic coordinates and their projection onto the flat world plane.
//!
//! Three spaces are involved:
//! - Earth space: longitude/latitude angles on the planet's surface.
//! - World space: a flat Cartesian plane in metres whose origin is the
//!   midpoint of the imported region.
//! - Grid space: world space divided into tiles. The grid has odd dimensions
//!   so the origin is the center of a single tile.

pub mod coords;
pub mod map;

use thiserror::Error;

pub use coords::{GeoCoords, Latitude, Longitude, Vec2};
pub use map::{GeoMap, DEFAULT_ELEMENT_SIZE, LATITUDE_DEGREE_IN_METRES};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("longitude {0} degrees is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("latitude {0} degrees is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("grid dimension {0} is not odd")]
    EvenGridDimension(u32),

    #[error("bounds are empty: min ({min_lon}, {min_lat}) max ({max_lon}, {max_lat}) degrees")]
    EmptyBounds {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },

    #[error("grid element size ({x}, {y}) must be positive and finite")]
    InvalidElementSize { x: f64, y: f64 },
}
