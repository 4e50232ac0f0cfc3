//! # Geographic Bounds
//!
//! Turns the requester's north-west / south-east corner pair into the
//! closed ring the spatial store queries against.
//!
//! Corners are `(lat, lon)` in degrees. The ring is always five points,
//! NW, NE, SE, SW and NW again: the store rejects rings that do not end
//! where they started.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::errors::GeoError;

/// Geometry type name used in store documents.
pub const POLYGON_TYPE: &str = "Polygon";

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude, degrees
    #[serde(default)]
    pub lat: f64,
    /// Longitude, degrees
    #[serde(default)]
    pub lon: f64,
}

impl LatLon {
    /// Create a coordinate pair.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), GeoError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GeoError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Validated rectangle between two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    nw: LatLon,
    se: LatLon,
}

impl BoundingBox {
    /// Build a box from its north-west and south-east corners.
    ///
    /// # Errors
    ///
    /// - `GeoError::OutOfRange` if a coordinate leaves the valid range
    /// - `GeoError::LatitudeInverted` if `nw` is south of `se`
    /// - `GeoError::LongitudeInverted` if `nw` is east of `se`
    pub fn new(nw: LatLon, se: LatLon) -> Result<Self, GeoError> {
        check_range("nw.lat", nw.lat, -90.0, 90.0)?;
        check_range("nw.lon", nw.lon, -180.0, 180.0)?;
        check_range("se.lat", se.lat, -90.0, 90.0)?;
        check_range("se.lon", se.lon, -180.0, 180.0)?;

        if nw.lat < se.lat {
            return Err(GeoError::LatitudeInverted {
                nw: nw.lat,
                se: se.lat,
            });
        }
        if nw.lon > se.lon {
            return Err(GeoError::LongitudeInverted {
                nw: nw.lon,
                se: se.lon,
            });
        }
        Ok(Self { nw, se })
    }

    pub fn nw(&self) -> LatLon {
        self.nw
    }

    /// NW latitude with SE longitude.
    pub fn ne(&self) -> LatLon {
        LatLon::new(self.nw.lat, self.se.lon)
    }

    pub fn se(&self) -> LatLon {
        self.se
    }

    /// SE latitude with NW longitude.
    pub fn sw(&self) -> LatLon {
        LatLon::new(self.se.lat, self.nw.lon)
    }

    /// Closed five-point ring: NW, NE, SE, SW, NW.
    pub fn to_polygon(&self) -> ClosedPolygon {
        ClosedPolygon {
            points: [self.nw(), self.ne(), self.se(), self.sw(), self.nw()],
        }
    }

    /// Axis-aligned extent of the box.
    pub fn rect(&self) -> GeoRect {
        GeoRect {
            min_lat: self.se.lat,
            max_lat: self.nw.lat,
            min_lon: self.nw.lon,
            max_lon: self.se.lon,
        }
    }
}

/// Closed ring of five points, first equal to last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedPolygon {
    points: [LatLon; 5],
}

impl ClosedPolygon {
    pub fn points(&self) -> &[LatLon; 5] {
        &self.points
    }

    /// Store-facing geometry document:
    /// `{"type": "Polygon", "coordinates": [[[lat, lon], ...5]]}`.
    pub fn to_geometry(&self) -> Value {
        let ring: Vec<Value> = self.points.iter().map(|p| json!([p.lat, p.lon])).collect();
        json!({
            "type": POLYGON_TYPE,
            "coordinates": [ring],
        })
    }

    /// Axis-aligned extent of the ring.
    pub fn rect(&self) -> GeoRect {
        GeoRect::enclosing(self.points.iter().copied()).unwrap_or_default()
    }
}

/// Axis-aligned rectangle, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoRect {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoRect {
    /// Smallest rectangle containing every point, `None` for no points.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLon>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let start = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        Some(iter.fold(start, |r, p| Self {
            min_lat: r.min_lat.min(p.lat),
            max_lat: r.max_lat.max(p.lat),
            min_lon: r.min_lon.min(p.lon),
            max_lon: r.max_lon.max(p.lon),
        }))
    }

    /// Extent of a stored polygon geometry, `None` if it is not one.
    pub fn from_geometry(geometry: &Value) -> Option<Self> {
        if geometry.get("type")?.as_str()? != POLYGON_TYPE {
            return None;
        }
        let ring = geometry.get("coordinates")?.as_array()?.first()?.as_array()?;
        let points: Option<Vec<LatLon>> = ring
            .iter()
            .map(|pair| {
                let pair = pair.as_array()?;
                Some(LatLon::new(pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
            })
            .collect();
        Self::enclosing(points?)
    }

    /// Whether the rectangles share at least one point.
    pub fn intersects(&self, other: &GeoRect) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_box() -> BoundingBox {
        BoundingBox::new(LatLon::new(1.0, -10.0), LatLon::new(-1.0, 10.0)).unwrap()
    }

    #[test]
    fn test_derived_corners() {
        let bb = sample_box();
        assert_eq!(bb.ne(), LatLon::new(1.0, 10.0));
        assert_eq!(bb.sw(), LatLon::new(-1.0, -10.0));
    }

    #[test]
    fn test_polygon_order_and_closure() {
        let polygon = sample_box().to_polygon();
        let points = polygon.points();

        assert_eq!(points[0], LatLon::new(1.0, -10.0));
        assert_eq!(points[1], LatLon::new(1.0, 10.0));
        assert_eq!(points[2], LatLon::new(-1.0, 10.0));
        assert_eq!(points[3], LatLon::new(-1.0, -10.0));
        assert_eq!(points[4], points[0]);
    }

    #[test]
    fn test_geometry_document_shape() {
        let geometry = sample_box().to_polygon().to_geometry();

        assert_eq!(geometry["type"], "Polygon");
        let ring = geometry["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], json!([1.0, -10.0]));
        assert_eq!(ring[2], json!([-1.0, 10.0]));
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn test_geometry_rect_roundtrip() {
        let bb = sample_box();
        let rect = GeoRect::from_geometry(&bb.to_polygon().to_geometry()).unwrap();
        assert_eq!(rect, bb.rect());
        assert_eq!(rect, bb.to_polygon().rect());
    }

    #[test]
    fn test_inverted_corners_rejected() {
        assert!(matches!(
            BoundingBox::new(LatLon::new(-1.0, -10.0), LatLon::new(1.0, 10.0)),
            Err(GeoError::LatitudeInverted { .. })
        ));
        assert!(matches!(
            BoundingBox::new(LatLon::new(1.0, 10.0), LatLon::new(-1.0, -10.0)),
            Err(GeoError::LongitudeInverted { .. })
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            BoundingBox::new(LatLon::new(91.0, -10.0), LatLon::new(-1.0, 10.0)),
            Err(GeoError::OutOfRange { field: "nw.lat", .. })
        ));
    }

    #[test]
    fn test_degenerate_box_allowed() {
        let p = LatLon::new(42.0, -83.0);
        let bb = BoundingBox::new(p, p).unwrap();
        assert!(bb.to_polygon().points().iter().all(|q| *q == p));
    }

    #[test]
    fn test_rect_intersection() {
        let a = sample_box().rect();
        let touching = GeoRect {
            min_lat: 1.0,
            max_lat: 2.0,
            min_lon: 10.0,
            max_lon: 11.0,
        };
        let apart = GeoRect {
            min_lat: 5.0,
            max_lat: 6.0,
            min_lon: 0.0,
            max_lon: 1.0,
        };
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_non_polygon_geometry_ignored() {
        assert!(GeoRect::from_geometry(&json!({"type": "Point", "coordinates": [1.0, 2.0]})).is_none());
        assert!(GeoRect::from_geometry(&json!({"type": "Polygon", "coordinates": []})).is_none());
    }

    proptest! {
        #[test]
        fn prop_polygon_always_closed(
            nw_lat in -90.0f64..=90.0,
            se_lat in -90.0f64..=90.0,
            nw_lon in -180.0f64..=180.0,
            se_lon in -180.0f64..=180.0,
        ) {
            let nw = LatLon::new(nw_lat.max(se_lat), nw_lon.min(se_lon));
            let se = LatLon::new(nw_lat.min(se_lat), nw_lon.max(se_lon));
            let polygon = BoundingBox::new(nw, se).unwrap().to_polygon();

            prop_assert_eq!(polygon.points().len(), 5);
            prop_assert_eq!(polygon.points()[0], polygon.points()[4]);
            prop_assert_eq!(polygon.points()[1].lat, nw.lat);
            prop_assert_eq!(polygon.points()[1].lon, se.lon);
            prop_assert_eq!(polygon.points()[3].lat, se.lat);
            prop_assert_eq!(polygon.points()[3].lon, nw.lon);
        }
    }
}
