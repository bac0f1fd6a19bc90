//! Centroid-based initial framing for the map view.

use geo::{BoundingRect, Point, Rect};

use crate::models::AdminCollection;

/// Where the renderer should center and what it should keep in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    /// Mean of the unit centroids
    pub center: Point<f64>,
    /// Bounding rectangle of every unit
    pub bounds: Rect<f64>,
}

impl MapFrame {
    /// Frame a collection; `None` when it has no measurable geometry.
    pub fn of(collection: &AdminCollection) -> Option<Self> {
        let centroids: Vec<Point<f64>> = collection.iter().filter_map(|u| u.centroid()).collect();
        if centroids.is_empty() {
            return None;
        }
        let n = centroids.len() as f64;
        let (sum_x, sum_y) = centroids
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.x(), y + p.y()));

        let bounds = collection
            .iter()
            .filter_map(|u| u.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })?;

        Some(Self {
            center: Point::new(sum_x / n, sum_y / n),
            bounds,
        })
    }

    /// Center as `[lat, lon]`, the order web map libraries expect.
    pub fn center_lat_lon(&self) -> [f64; 2] {
        [self.center.y(), self.center.x()]
    }
}
