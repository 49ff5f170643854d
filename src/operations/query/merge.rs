use std::collections::HashMap;

use crate::math::{is_on_grid, quantize, Point3};
use crate::model::{Document, EntityId, PointId};

/// Key for hashing points by their snapped grid cell.
///
/// Holds the bit patterns of the quantized coordinates, with `-0.0` folded
/// into `0.0` so both land in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GridKey {
    x: u64,
    y: u64,
    z: u64,
}

impl GridKey {
    fn from_point(p: &Point3) -> Self {
        Self {
            x: cell_bits(p.x),
            y: cell_bits(p.y),
            z: cell_bits(p.z),
        }
    }
}

fn cell_bits(coord: f64) -> u64 {
    // Adding positive zero turns `-0.0` into `0.0` and leaves the rest alone.
    (quantize(coord) + 0.0).to_bits()
}

fn is_snapped(p: &Point3) -> bool {
    is_on_grid(p.x) && is_on_grid(p.y) && is_on_grid(p.z)
}

/// Checks that every live point already sits on the integer grid.
#[derive(Debug, Default)]
pub struct CoordinatesAreIntegral;

impl CoordinatesAreIntegral {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn execute(&self, doc: &Document) -> bool {
        doc.points().iter().all(|(_, point)| is_snapped(&point.position))
    }
}

/// Checks that no two live points snap to the same grid cell.
#[derive(Debug, Default)]
pub struct PointsAreMerged;

impl PointsAreMerged {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn execute(&self, doc: &Document) -> bool {
        let mut seen: HashMap<GridKey, PointId> = HashMap::new();
        for (id, point) in doc.points().iter() {
            let key = GridKey::from_point(&point.position);
            if let Some(&first) = seen.get(&key) {
                tracing::debug!(first = first.raw(), duplicate = id.raw(), "coincident points");
                return false;
            }
            seen.insert(key, id);
        }
        true
    }
}

/// Weld status of a document's points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Live points with at least one non-integral coordinate, ascending.
    pub unsnapped: Vec<PointId>,
    /// Groups of live points sharing a grid cell. Each group is ascending
    /// and groups are ordered by their first member.
    pub coincident: Vec<Vec<PointId>>,
}

impl MergeReport {
    /// Returns `true` if the mesh is snapped and welded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unsnapped.is_empty() && self.coincident.is_empty()
    }
}

/// Finds unsnapped and coincident points in one pass.
///
/// Grid cells are indexed by a hash map, so the cost is linear in the
/// number of live points.
#[derive(Debug, Default)]
pub struct DetectCoincidence;

impl DetectCoincidence {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn execute(&self, doc: &Document) -> MergeReport {
        let mut unsnapped = Vec::new();
        let mut cells: HashMap<GridKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<PointId>> = Vec::new();

        for (id, point) in doc.points().iter() {
            if !is_snapped(&point.position) {
                unsnapped.push(id);
            }
            let key = GridKey::from_point(&point.position);
            match cells.get(&key) {
                Some(&group) => groups[group].push(id),
                None => {
                    cells.insert(key, groups.len());
                    groups.push(vec![id]);
                }
            }
        }

        groups.retain(|group| group.len() > 1);
        MergeReport {
            unsnapped,
            coincident: groups,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn doc_with(points: &[(f64, f64, f64)]) -> (Document, Vec<PointId>) {
        let mut doc = Document::new();
        let ids = points
            .iter()
            .map(|&(x, y, z)| doc.add_point(Point3::new(x, y, z)).unwrap())
            .collect();
        (doc, ids)
    }

    #[test]
    fn duplicate_vertex_is_not_merged() {
        let (mut doc, ids) = doc_with(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 0.0, 0.0)]);
        assert!(CoordinatesAreIntegral::new().execute(&doc));
        assert!(!PointsAreMerged::new().execute(&doc));
        assert!(!doc.is_fully_merged());

        doc.remove_point(ids[2]);
        assert!(PointsAreMerged::new().execute(&doc));
        assert!(doc.is_fully_merged());
    }

    #[test]
    fn fractional_coordinate_is_not_merged() {
        let (doc, _) = doc_with(&[(0.5, 0.0, 0.0)]);
        assert!(!doc.coordinates_are_integral());
        assert!(doc.points_are_merged());
        assert!(!doc.is_fully_merged());
    }

    #[test]
    fn near_duplicates_share_a_cell() {
        let (doc, ids) = doc_with(&[(2.4, 0.0, 0.0), (1.5, 0.0, 0.0), (2.0, 0.0, 0.0)]);
        assert!(!doc.points_are_merged());

        let report = DetectCoincidence::new().execute(&doc);
        assert_eq!(report.unsnapped, vec![ids[0], ids[1]]);
        assert_eq!(report.coincident, vec![vec![ids[0], ids[1], ids[2]]]);
        assert!(!report.is_clean());
    }

    #[test]
    fn negative_halves_round_up() {
        // -0.5 snaps to 0; -1.5 snaps to -1, not -2.
        let (doc, ids) = doc_with(&[
            (-0.5, 0.0, 0.0),
            (0.0, 0.0, 0.0),
            (-1.5, 0.0, 0.0),
            (-2.0, 0.0, 0.0),
        ]);
        let report = DetectCoincidence::new().execute(&doc);
        assert_eq!(report.coincident, vec![vec![ids[0], ids[1]]]);
    }

    #[test]
    fn distant_points_keep_distinct_cells() {
        let (doc, _) = doc_with(&[(1e19, 0.0, 0.0), (2e19, 0.0, 0.0), (-1e19, 0.0, 0.0)]);
        assert!(doc.points_are_merged());
        assert!(doc.coordinates_are_integral());
    }

    #[test]
    fn signed_zero_shares_a_cell() {
        let (doc, ids) = doc_with(&[(-0.0, 0.0, 0.0), (0.0, -0.2, 0.0)]);
        let report = DetectCoincidence::new().execute(&doc);
        assert_eq!(report.coincident, vec![vec![ids[0], ids[1]]]);
        assert_eq!(report.unsnapped, vec![ids[1]]);
    }

    #[test]
    fn value_just_below_half_stays_in_lower_cell() {
        let (doc, _) = doc_with(&[(0.499_999_999_999_999_94, 0.0, 0.0), (1.0, 0.0, 0.0)]);
        assert!(doc.points_are_merged());
    }

    #[test]
    fn empty_document_is_merged() {
        let doc = Document::new();
        assert!(doc.is_fully_merged());
        assert_eq!(DetectCoincidence::new().execute(&doc), MergeReport::default());
    }

    #[test]
    fn freed_points_are_ignored() {
        let (mut doc, ids) = doc_with(&[(0.3, 0.0, 0.0), (0.0, 0.0, 0.0)]);
        doc.remove_point(ids[0]);
        assert!(doc.is_fully_merged());
    }
}
