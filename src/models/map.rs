//! Input handed to the external map-tile collaborator

use serde::{Deserialize, Serialize};

use super::{Destination, PointOfInterest};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Destination,
    PointOfInterest,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapMarker {
    pub kind: MarkerKind,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Secondary popup line (category and distance for points of interest)
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Center on `destination` and mark it plus every point of interest that
    /// carries coordinates.
    #[must_use]
    pub fn new(destination: &Destination, points: &[PointOfInterest], zoom: u8) -> Self {
        let mut markers = Vec::with_capacity(points.len() + 1);
        markers.push(MapMarker {
            kind: MarkerKind::Destination,
            label: destination.display_name.clone(),
            latitude: destination.latitude,
            longitude: destination.longitude,
            detail: None,
        });

        markers.extend(points.iter().filter_map(|poi| {
            let (latitude, longitude) = poi.coordinates()?;
            Some(MapMarker {
                kind: MarkerKind::PointOfInterest,
                label: poi.name.clone(),
                latitude,
                longitude,
                detail: Some(format!("{} · {}", poi.category_label, poi.distance_label)),
            })
        }));

        Self {
            center: (destination.latitude, destination.longitude),
            zoom,
            markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(name: &str, coords: Option<(f64, f64)>) -> PointOfInterest {
        PointOfInterest {
            id: name.to_lowercase(),
            name: name.to_string(),
            category_label: "Strand".to_string(),
            address_label: "Blvd. Kukulcan".to_string(),
            distance_label: "850m".to_string(),
            photo_url: None,
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            reference_url: None,
        }
    }

    #[test]
    fn test_map_view_skips_points_without_coordinates() {
        let cancun = Destination::new("cancun", "Cancun", "Cancún", 21.1619, -86.8515);
        let points = vec![
            poi("Playa Delfines", Some((21.06, -86.78))),
            poi("Nowhere", None),
        ];

        let view = MapView::new(&cancun, &points, 12);

        assert_eq!(view.center, (21.1619, -86.8515));
        assert_eq!(view.zoom, 12);
        assert_eq!(view.markers.len(), 2);
        assert_eq!(view.markers[0].kind, MarkerKind::Destination);
        assert_eq!(view.markers[0].label, "Cancún");
        assert_eq!(view.markers[1].label, "Playa Delfines");
        assert_eq!(view.markers[1].detail.as_deref(), Some("Strand · 850m"));
    }
}
