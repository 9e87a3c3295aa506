use std::f64::consts::{FRAC_PI_2, PI};
use std::ops::{Add, Div, Mul, Sub};

use serde::Serialize;

use super::GeoError;

/// Longitude, stored in radians.
///
/// Positions built from input are checked to lie in [-pi, pi]. Values produced
/// by the arithmetic operators are offsets and midpoints, so they are not
/// range checked.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Longitude {
    value: f64,
}

impl Longitude {
    pub fn degrees(degrees: f64) -> Result<Self, GeoError> {
        if !degrees.is_finite() || !(-180.0..=180.0).contains(&degrees) {
            return Err(GeoError::LongitudeOutOfRange(degrees));
        }
        Ok(Longitude {
            value: degrees.to_radians(),
        })
    }

    pub fn radians(radians: f64) -> Result<Self, GeoError> {
        if !radians.is_finite() || !(-PI..=PI).contains(&radians) {
            return Err(GeoError::LongitudeOutOfRange(radians.to_degrees()));
        }
        Ok(Longitude { value: radians })
    }

    pub(crate) fn unchecked(radians: f64) -> Self {
        Longitude { value: radians }
    }

    pub fn as_radians(self) -> f64 {
        self.value
    }

    pub fn as_degrees(self) -> f64 {
        self.value.to_degrees()
    }
}

impl Add for Longitude {
    type Output = Longitude;

    fn add(self, rhs: Longitude) -> Longitude {
        Longitude::unchecked(self.value + rhs.value)
    }
}

impl Sub for Longitude {
    type Output = Longitude;

    fn sub(self, rhs: Longitude) -> Longitude {
        Longitude::unchecked(self.value - rhs.value)
    }
}

impl Mul<f64> for Longitude {
    type Output = Longitude;

    fn mul(self, scalar: f64) -> Longitude {
        Longitude::unchecked(self.value * scalar)
    }
}

/// Latitude, stored in radians. Checked to lie in [-pi/2, pi/2] on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Latitude {
    value: f64,
}

impl Latitude {
    pub fn degrees(degrees: f64) -> Result<Self, GeoError> {
        if !degrees.is_finite() || !(-90.0..=90.0).contains(&degrees) {
            return Err(GeoError::LatitudeOutOfRange(degrees));
        }
        Ok(Latitude {
            value: degrees.to_radians(),
        })
    }

    pub fn radians(radians: f64) -> Result<Self, GeoError> {
        if !radians.is_finite() || !(-FRAC_PI_2..=FRAC_PI_2).contains(&radians) {
            return Err(GeoError::LatitudeOutOfRange(radians.to_degrees()));
        }
        Ok(Latitude { value: radians })
    }

    pub(crate) fn unchecked(radians: f64) -> Self {
        Latitude { value: radians }
    }

    pub fn as_radians(self) -> f64 {
        self.value
    }

    pub fn as_degrees(self) -> f64 {
        self.value.to_degrees()
    }
}

impl Add for Latitude {
    type Output = Latitude;

    fn add(self, rhs: Latitude) -> Latitude {
        Latitude::unchecked(self.value + rhs.value)
    }
}

impl Sub for Latitude {
    type Output = Latitude;

    fn sub(self, rhs: Latitude) -> Latitude {
        Latitude::unchecked(self.value - rhs.value)
    }
}

impl Mul<f64> for Latitude {
    type Output = Latitude;

    fn mul(self, scalar: f64) -> Latitude {
        Latitude::unchecked(self.value * scalar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoords {
    pub lon: Longitude,
    pub lat: Latitude,
}

impl GeoCoords {
    pub fn new(lon: Longitude, lat: Latitude) -> Self {
        GeoCoords { lon, lat }
    }

    /// Builds checked coordinates from decimal degrees, as found in map exports.
    pub fn from_degrees(lon: f64, lat: f64) -> Result<Self, GeoError> {
        Ok(GeoCoords {
            lon: Longitude::degrees(lon)?,
            lat: Latitude::degrees(lat)?,
        })
    }

    pub fn midpoint(self, other: GeoCoords) -> GeoCoords {
        (self + other) * 0.5
    }
}

impl Default for GeoCoords {
    fn default() -> Self {
        GeoCoords {
            lon: Longitude::unchecked(0.0),
            lat: Latitude::unchecked(0.0),
        }
    }
}

impl Add for GeoCoords {
    type Output = GeoCoords;

    fn add(self, rhs: GeoCoords) -> GeoCoords {
        GeoCoords::new(self.lon + rhs.lon, self.lat + rhs.lat)
    }
}

impl Sub for GeoCoords {
    type Output = GeoCoords;

    fn sub(self, rhs: GeoCoords) -> GeoCoords {
        GeoCoords::new(self.lon - rhs.lon, self.lat - rhs.lat)
    }
}

impl Mul<f64> for GeoCoords {
    type Output = GeoCoords;

    fn mul(self, scalar: f64) -> GeoCoords {
        GeoCoords::new(self.lon * scalar, self.lat * scalar)
    }
}

/// A point or extent in world or grid space. `x` grows eastwards, `y`
/// northwards.
#[derive(rkyv::Archive, rkyv::Deserialize, rkyv::Serialize, Serialize)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[archive(check_bytes)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn abs(self) -> Vec2 {
        Vec2::new(self.x.abs(), self.y.abs())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, scalar: f64) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

/// Componentwise division.
impl Div for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x / rhs.x, self.y / rhs.y)
    }
}
