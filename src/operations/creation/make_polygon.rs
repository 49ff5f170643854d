use std::collections::HashSet;

use crate::error::{ModelError, Result};
use crate::model::{Document, EntityId, PointId, PolygonId};

/// Creates a polygon whose ring runs through existing points, in order.
pub struct MakePolygon {
    points: Vec<PointId>,
    color: u8,
}

impl MakePolygon {
    /// Creates a new `MakePolygon` operation.
    #[must_use]
    pub fn new(points: Vec<PointId>, color: u8) -> Self {
        Self { points, color }
    }

    /// Executes the operation, creating the polygon in the document.
    ///
    /// Every check runs before anything is allocated or linked.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidArgument`] for fewer than three points, a
    ///   repeated point, or a point that already has a successor.
    /// - [`ModelError::NotFound`] if a point is not valid.
    /// - [`ModelError::CapacityExhausted`] if the polygon table is full.
    pub fn execute(&self, doc: &mut Document) -> Result<PolygonId> {
        if self.points.len() < 3 {
            return Err(ModelError::InvalidArgument(format!(
                "a polygon needs at least 3 points, got {}",
                self.points.len()
            ))
            .into());
        }

        let mut seen = HashSet::with_capacity(self.points.len());
        for &id in &self.points {
            let point = doc.point(id).ok_or(id.not_found())?;
            if point.next_point().is_some() {
                return Err(ModelError::InvalidArgument(format!(
                    "point #{} already has a successor",
                    id.raw()
                ))
                .into());
            }
            if !seen.insert(id) {
                return Err(ModelError::InvalidArgument(format!(
                    "point #{} appears twice",
                    id.raw()
                ))
                .into());
            }
        }

        let polygon = doc.add_polygon(self.color)?;
        doc.link_ring(polygon, &self.points)?;
        tracing::debug!(polygon = polygon.raw(), vertices = self.points.len(), "polygon created");
        Ok(polygon)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PolycadError;
    use crate::math::Point3;

    fn points(doc: &mut Document, n: u16) -> Vec<PointId> {
        (0..n)
            .map(|i| doc.add_point(Point3::new(f64::from(i), 0.0, 1.0)).unwrap())
            .collect()
    }

    fn is_invalid_argument(result: Result<PolygonId>) -> bool {
        matches!(
            result,
            Err(PolycadError::Model(ModelError::InvalidArgument(_)))
        )
    }

    #[test]
    fn builds_a_valid_ring() {
        let mut doc = Document::new();
        let ids = points(&mut doc, 5);
        let poly = MakePolygon::new(ids.clone(), 3).execute(&mut doc).unwrap();

        let record = doc.polygon(poly).unwrap();
        assert_eq!(record.vertex_count(), 5);
        assert_eq!(record.color, 3);
        assert_eq!(doc.polygon_points(poly).collect::<Vec<_>>(), ids);
        assert!(doc.validate_polygon(poly));
    }

    #[test]
    fn rejects_degenerate_input_without_mutation() {
        let mut doc = Document::new();
        let ids = points(&mut doc, 3);

        assert!(is_invalid_argument(
            MakePolygon::new(ids[..2].to_vec(), 0).execute(&mut doc)
        ));
        assert!(is_invalid_argument(
            MakePolygon::new(vec![ids[0], ids[1], ids[0]], 0).execute(&mut doc)
        ));
        let missing = MakePolygon::new(vec![ids[0], ids[1], PointId::new(99)], 0).execute(&mut doc);
        assert!(matches!(
            missing,
            Err(PolycadError::Model(ModelError::NotFound { .. }))
        ));

        assert_eq!(doc.statistics().polygons, 0);
        assert!(ids.iter().all(|&id| doc.next_point(id).is_none()));
    }

    #[test]
    fn rejects_points_already_linked() {
        let mut doc = Document::new();
        let ids = points(&mut doc, 6);
        MakePolygon::new(ids[..3].to_vec(), 0).execute(&mut doc).unwrap();

        let reuse = vec![ids[1], ids[3], ids[4]];
        assert!(is_invalid_argument(MakePolygon::new(reuse, 0).execute(&mut doc)));
        assert_eq!(doc.statistics().polygons, 1);
    }
}
