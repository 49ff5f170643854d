use serde::{Deserialize, Serialize};

use super::arena::entity_id;
use super::EntityKind;
use crate::math::Point3;

entity_id! {
    /// Slot index of a point in the document.
    pub struct PointId => EntityKind::Point;
}

/// A vertex record.
///
/// `next_point` threads the vertex ring of the polygon that owns this point.
/// It can only be grown through
/// [`Document::append_point_to_polygon`](crate::Document::append_point_to_polygon).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// World-space position.
    pub position: Point3,
    next_point: Option<PointId>,
}

impl Point {
    /// Creates an unlinked point.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            next_point: None,
        }
    }

    /// The successor on the owning polygon's ring.
    #[must_use]
    pub fn next_point(&self) -> Option<PointId> {
        self.next_point
    }

    pub(crate) fn set_next_point(&mut self, next: Option<PointId>) {
        self.next_point = next;
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}
