use serde::{Deserialize, Serialize};

use super::arena::entity_id;
use super::{EntityKind, PolygonId};
use crate::math::Vector3;

entity_id! {
    /// Slot index of an object in the document.
    pub struct ObjectId => EntityKind::Object;
}

/// A node of the scene tree.
///
/// Children form a singly linked sibling list: `child` is the first child,
/// and each child's `next_brother` the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Translation relative to the parent.
    pub offset: Vector3,
    parent: Option<ObjectId>,
    child: Option<ObjectId>,
    next_brother: Option<ObjectId>,
    first_polygon: Option<PolygonId>,
}

impl Object {
    /// Creates an unlinked object.
    #[must_use]
    pub fn new(offset: Vector3) -> Self {
        Self {
            offset,
            parent: None,
            child: None,
            next_brother: None,
            first_polygon: None,
        }
    }

    /// Parent object, `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// First child.
    #[must_use]
    pub fn child(&self) -> Option<ObjectId> {
        self.child
    }

    /// Next sibling under the same parent.
    #[must_use]
    pub fn next_brother(&self) -> Option<ObjectId> {
        self.next_brother
    }

    /// Head of the object's polygon chain.
    #[must_use]
    pub fn first_polygon(&self) -> Option<PolygonId> {
        self.first_polygon
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }

    pub(crate) fn set_child(&mut self, child: Option<ObjectId>) {
        self.child = child;
    }

    pub(crate) fn set_next_brother(&mut self, next: Option<ObjectId>) {
        self.next_brother = next;
    }

    pub(crate) fn set_first_polygon(&mut self, first: Option<PolygonId>) {
        self.first_polygon = first;
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new(Vector3::zeros())
    }
}
