use serde::{Deserialize, Serialize};

use super::arena::entity_id;
use super::{EntityKind, PointId};

entity_id! {
    /// Slot index of a polygon in the document.
    pub struct PolygonId => EntityKind::Polygon;
}

/// A polygon record: a ring of points plus appearance metadata.
///
/// The declared vertex count is maintained by the chain API and checked by
/// [`ValidatePolygon`](crate::operations::query::ValidatePolygon).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Palette index.
    pub color: u8,
    /// Reserved per-polygon metadata; stored, never interpreted.
    pub animation: u8,
    /// Reserved link to a paired polygon; stored, never interpreted.
    pub both: Option<PolygonId>,
    /// Reserved per-polygon metadata; stored, never interpreted.
    pub side: u8,
    first_point: Option<PointId>,
    vertex_count: u16,
    next_polygon: Option<PolygonId>,
}

impl Polygon {
    /// Creates a polygon with an empty ring.
    #[must_use]
    pub fn new(color: u8) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Head of the vertex ring.
    #[must_use]
    pub fn first_point(&self) -> Option<PointId> {
        self.first_point
    }

    /// Number of vertices the ring is declared to hold.
    #[must_use]
    pub fn vertex_count(&self) -> u16 {
        self.vertex_count
    }

    /// Successor on the owning object's polygon chain.
    #[must_use]
    pub fn next_polygon(&self) -> Option<PolygonId> {
        self.next_polygon
    }

    pub(crate) fn set_first_point(&mut self, first: Option<PointId>, vertex_count: u16) {
        self.first_point = first;
        self.vertex_count = vertex_count;
    }

    pub(crate) fn set_vertex_count(&mut self, vertex_count: u16) {
        self.vertex_count = vertex_count;
    }

    pub(crate) fn set_next_polygon(&mut self, next: Option<PolygonId>) {
        self.next_polygon = next;
    }
}
