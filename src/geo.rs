//! Geographic coordinates and the location-bearing capability.

use std::fmt;

use glam::DVec2;

use crate::error::ClusterError;

/// A point on the map in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Coordinate from latitude/longitude degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Coordinate from degrees, rejecting out-of-range or non-finite input.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, ClusterError> {
        let coordinate = Self::new(latitude, longitude);
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(ClusterError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Whether latitude is in [-90, 90] and longitude in [-180, 180].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Linear interpolation toward `other`. `t` is not clamped.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::from_dvec2(self.to_dvec2().lerp(other.to_dvec2(), t))
    }

    /// Planar distance in degrees. Only meant for comparisons and tests,
    /// not for geodesic measurement.
    #[must_use]
    pub fn degrees_to(self, other: Self) -> f64 {
        self.to_dvec2().distance(other.to_dvec2())
    }

    /// Mean of a set of coordinates, or `None` for an empty set.
    pub fn centroid<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let (sum, count) = coordinates
            .into_iter()
            .fold((DVec2::ZERO, 0_u32), |(sum, n), c| {
                (sum + c.to_dvec2(), n + 1)
            });
        (count > 0).then(|| Self::from_dvec2(sum / f64::from(count)))
    }

    fn to_dvec2(self) -> DVec2 {
        DVec2::new(self.longitude, self.latitude)
    }

    fn from_dvec2(v: DVec2) -> Self {
        Self::new(v.y, v.x)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Anything that sits at a geographic coordinate.
///
/// Implemented by markers (individual and cluster) and by the views that
/// display them.
pub trait Located {
    /// Current coordinate.
    fn coordinate(&self) -> Coordinate;
}

impl Located for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = Coordinate::new(52.0, 13.0);
        let b = Coordinate::new(53.0, 15.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        let mid = a.lerp(b, 0.5);
        assert!((mid.latitude - 52.5).abs() < 1e-12);
        assert!((mid.longitude - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_validity() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(matches!(
            Coordinate::checked(100.0, 0.0),
            Err(ClusterError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_centroid() {
        assert_eq!(Coordinate::centroid(std::iter::empty()), None);
        let c = Coordinate::centroid([
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 4.0),
        ]);
        assert_eq!(c, Some(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn test_degrees_to() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0);
        assert!((a.degrees_to(b) - 5.0).abs() < 1e-12);
    }
}
