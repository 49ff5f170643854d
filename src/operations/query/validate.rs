use crate::model::{Document, ObjectId, PolygonId};

/// Checks that a polygon's ring matches its declared vertex count.
///
/// The ring must hold at least three points, every point on it must be live,
/// and its length must equal the declared count exactly.
pub struct ValidatePolygon {
    polygon: PolygonId,
}

impl ValidatePolygon {
    /// Creates a new `ValidatePolygon` query.
    #[must_use]
    pub fn new(polygon: PolygonId) -> Self {
        Self { polygon }
    }

    /// Executes the validation, returning `true` if the polygon is sound.
    #[must_use]
    pub fn execute(&self, doc: &Document) -> bool {
        let Some(polygon) = doc.polygon(self.polygon) else {
            return false;
        };
        let declared = usize::from(polygon.vertex_count());
        if declared < 3 {
            return false;
        }

        let mut current = polygon.first_point();
        let mut count = 0;
        while let Some(id) = current {
            if count == declared {
                break;
            }
            let Some(point) = doc.point(id) else {
                return false;
            };
            current = point.next_point();
            count += 1;
        }

        // A ring that still continues after `declared` hops is too long.
        count == declared && current.is_none()
    }
}

/// Structural problems found by [`CheckStructure`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureReport {
    /// Live polygons that fail [`ValidatePolygon`].
    pub invalid_polygons: Vec<PolygonId>,
    /// Live objects whose parent link points at a free slot.
    pub orphaned_objects: Vec<ObjectId>,
    /// Live objects whose parent path or child list does not end within the
    /// object table's capacity.
    pub looping_objects: Vec<ObjectId>,
}

impl StructureReport {
    /// Returns `true` if no problem was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid_polygons.is_empty()
            && self.orphaned_objects.is_empty()
            && self.looping_objects.is_empty()
    }
}

/// Follows `step` from `start` and returns `true` if it reaches `None` within
/// `limit` hops.
fn ends_within(
    start: Option<ObjectId>,
    limit: usize,
    step: impl Fn(ObjectId) -> Option<ObjectId>,
) -> bool {
    let mut current = start;
    for _ in 0..=limit {
        match current {
            None => return true,
            Some(id) => current = step(id),
        }
    }
    false
}

/// Document-wide structural check, run after loading and meant to run
/// before saving.
#[derive(Debug, Default)]
pub struct CheckStructure;

impl CheckStructure {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn execute(&self, doc: &Document) -> StructureReport {
        let invalid_polygons: Vec<_> = doc
            .polygons()
            .ids()
            .filter(|&id| !ValidatePolygon::new(id).execute(doc))
            .collect();
        let orphaned_objects: Vec<_> = doc
            .objects()
            .iter()
            .filter(|(_, object)| object.parent().is_some_and(|p| !doc.is_object_valid(p)))
            .map(|(id, _)| id)
            .collect();
        let limit = doc.objects().capacity();
        let looping_objects: Vec<_> = doc
            .objects()
            .ids()
            .filter(|&id| {
                !ends_within(doc.parent_of(id), limit, |o| doc.parent_of(o))
                    || !ends_within(doc.first_child_of(id), limit, |o| doc.next_brother_of(o))
            })
            .collect();

        let report = StructureReport {
            invalid_polygons,
            orphaned_objects,
            looping_objects,
        };
        if !report.is_clean() {
            tracing::warn!(
                polygons = report.invalid_polygons.len(),
                orphans = report.orphaned_objects.len(),
                loops = report.looping_objects.len(),
                "structural problems found"
            );
        }
        report
    }
}
