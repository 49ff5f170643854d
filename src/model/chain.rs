//! Index-linked chains: polygon vertex rings, object polygon lists and the
//! object tree.
//!
//! Every walk is bounded by the capacity of the table it runs over, and the
//! mutators only ever link a tail to an entity with no successor, so no
//! chain can close on itself.

use super::{
    limits, Arena, Document, EntityId, EntityKind, Object, ObjectId, Point, PointId, Polygon,
    PolygonId,
};
use crate::error::{ModelError, Result};
use crate::math::Vector3;

/// Iterator over a singly linked chain of live entities.
///
/// Stops at the end of the chain, at the first free slot, or after as many
/// steps as the table has slots.
pub struct Chain<'a, K, T> {
    arena: &'a Arena<K, T>,
    next: Option<K>,
    remaining: usize,
    link: fn(&T) -> Option<K>,
}

impl<'a, K: EntityId, T> Chain<'a, K, T> {
    fn new(arena: &'a Arena<K, T>, start: Option<K>, link: fn(&T) -> Option<K>) -> Self {
        Self {
            arena,
            next: start,
            remaining: arena.capacity(),
            link,
        }
    }
}

impl<K: EntityId, T> Iterator for Chain<'_, K, T> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let id = self.next.take()?;
        if self.remaining == 0 {
            return None;
        }
        let record = self.arena.get(id)?;
        self.remaining -= 1;
        self.next = (self.link)(record);
        Some(id)
    }
}

/// Walks to the last live entity of a chain starting at `head`.
///
/// Fails with [`ModelError::InvalidArgument`] if `candidate` is already on
/// the chain, and with [`ModelError::BrokenChain`] if the walk meets a free
/// slot or needs more than `max_hops` steps.
fn find_tail<K: EntityId, T>(
    arena: &Arena<K, T>,
    head: K,
    max_hops: usize,
    candidate: K,
    link: fn(&T) -> Option<K>,
) -> std::result::Result<K, ModelError> {
    let mut current = head;
    let mut hops = 0;
    loop {
        if current == candidate {
            return Err(ModelError::InvalidArgument(format!(
                "{} #{} is already on this chain",
                K::KIND,
                candidate.raw()
            )));
        }
        let record = arena.get(current).ok_or(ModelError::BrokenChain {
            kind: K::KIND,
            index: current.raw(),
        })?;
        match link(record) {
            None => return Ok(current),
            Some(next) => {
                hops += 1;
                if hops >= max_hops {
                    return Err(ModelError::BrokenChain {
                        kind: K::KIND,
                        index: current.raw(),
                    });
                }
                current = next;
            }
        }
    }
}

impl Document {
    // --- Accessors ---

    /// Head of a polygon's vertex ring; `None` if the polygon is not valid.
    #[must_use]
    pub fn first_point_of_polygon(&self, polygon: PolygonId) -> Option<PointId> {
        self.polygons.get(polygon)?.first_point()
    }

    /// Successor of a point on its ring; `None` if the point is not valid.
    #[must_use]
    pub fn next_point(&self, point: PointId) -> Option<PointId> {
        self.points.get(point)?.next_point()
    }

    /// Successor of a polygon on its object's chain.
    #[must_use]
    pub fn next_polygon(&self, polygon: PolygonId) -> Option<PolygonId> {
        self.polygons.get(polygon)?.next_polygon()
    }

    #[must_use]
    pub fn first_polygon_of_object(&self, object: ObjectId) -> Option<PolygonId> {
        self.objects.get(object)?.first_polygon()
    }

    #[must_use]
    pub fn parent_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.objects.get(object)?.parent()
    }

    #[must_use]
    pub fn first_child_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.objects.get(object)?.child()
    }

    #[must_use]
    pub fn next_brother_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.objects.get(object)?.next_brother()
    }

    /// Live points of a polygon's ring, in ring order.
    pub fn polygon_points(&self, polygon: PolygonId) -> Chain<'_, PointId, Point> {
        Chain::new(
            &self.points,
            self.first_point_of_polygon(polygon),
            Point::next_point,
        )
    }

    /// Live polygons attached to an object, in chain order.
    pub fn object_polygons(&self, object: ObjectId) -> Chain<'_, PolygonId, Polygon> {
        Chain::new(
            &self.polygons,
            self.first_polygon_of_object(object),
            Polygon::next_polygon,
        )
    }

    /// Live children of an object, most recently attached first.
    pub fn children(&self, object: ObjectId) -> Chain<'_, ObjectId, Object> {
        Chain::new(&self.objects, self.first_child_of(object), Object::next_brother)
    }

    /// Live objects without a parent.
    pub fn root_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .iter()
            .filter(|(_, object)| object.parent().is_none())
            .map(|(id, _)| id)
    }

    // --- Vertex rings ---

    /// Appends a point to the end of a polygon's ring and bumps its vertex
    /// count.
    ///
    /// The walk to the tail is capped by the declared vertex count.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotFound`] if either entity is not valid.
    /// - [`ModelError::InvalidArgument`] if the point already has a successor
    ///   or is the ring's tail.
    /// - [`ModelError::BrokenChain`] if the ring runs through a free slot or
    ///   is longer than declared.
    ///
    /// Nothing is modified on error.
    pub fn append_point_to_polygon(&mut self, polygon: PolygonId, point: PointId) -> Result<()> {
        let record = self.polygons.get(polygon).ok_or(polygon.not_found())?;
        let (first, count) = (record.first_point(), record.vertex_count());
        let candidate = self.points.get(point).ok_or(point.not_found())?;
        if candidate.next_point().is_some() {
            return Err(ModelError::InvalidArgument(format!(
                "point #{} already has a successor",
                point.raw()
            ))
            .into());
        }

        let Some(first) = first else {
            if let Some(record) = self.polygons.get_mut(polygon) {
                record.set_first_point(Some(point), 1);
            }
            self.mark_dirty();
            tracing::debug!(polygon = polygon.raw(), point = point.raw(), "ring started");
            return Ok(());
        };

        let tail = find_tail(
            &self.points,
            first,
            usize::from(count),
            point,
            Point::next_point,
        )
        .inspect_err(|err| tracing::warn!(polygon = polygon.raw(), %err, "cannot append point"))?;
        let count = count.checked_add(1).ok_or_else(|| {
            ModelError::InvalidArgument(format!("polygon #{} is full", polygon.raw()))
        })?;

        if let Some(tail) = self.points.get_mut(tail) {
            tail.set_next_point(Some(point));
        }
        if let Some(record) = self.polygons.get_mut(polygon) {
            record.set_vertex_count(count);
        }
        self.mark_dirty();
        tracing::debug!(polygon = polygon.raw(), point = point.raw(), count, "point appended");
        Ok(())
    }

    /// Links `points` into a fresh ring, in order. Used by
    /// [`MakePolygon`](crate::operations::creation::MakePolygon), which has
    /// already checked the points.
    pub(crate) fn link_ring(
        &mut self,
        polygon: PolygonId,
        points: &[PointId],
    ) -> std::result::Result<(), ModelError> {
        let count = u16::try_from(points.len())
            .map_err(|_| ModelError::InvalidArgument("too many vertices".into()))?;
        let record = self.polygons.get_mut(polygon).ok_or(polygon.not_found())?;
        record.set_first_point(points.first().copied(), count);
        for pair in points.windows(2) {
            if let Some(point) = self.points.get_mut(pair[0]) {
                point.set_next_point(Some(pair[1]));
            }
        }
        self.mark_dirty();
        Ok(())
    }

    // --- Object polygon lists ---

    /// Appends a polygon to the end of an object's polygon chain.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotFound`] if either entity is not valid.
    /// - [`ModelError::InvalidArgument`] if the polygon already has a
    ///   successor or is the chain's tail.
    /// - [`ModelError::BrokenChain`] if the chain runs through a free slot.
    pub fn append_polygon_to_object(&mut self, object: ObjectId, polygon: PolygonId) -> Result<()> {
        let first = self
            .objects
            .get(object)
            .ok_or(object.not_found())?
            .first_polygon();
        let candidate = self.polygons.get(polygon).ok_or(polygon.not_found())?;
        if candidate.next_polygon().is_some() {
            return Err(ModelError::InvalidArgument(format!(
                "polygon #{} already has a successor",
                polygon.raw()
            ))
            .into());
        }

        match first {
            None => {
                if let Some(record) = self.objects.get_mut(object) {
                    record.set_first_polygon(Some(polygon));
                }
            }
            Some(first) => {
                let tail = find_tail(
                    &self.polygons,
                    first,
                    limits::MAX_POLYGONS,
                    polygon,
                    Polygon::next_polygon,
                )?;
                if let Some(tail) = self.polygons.get_mut(tail) {
                    tail.set_next_polygon(Some(polygon));
                }
            }
        }
        self.mark_dirty();
        tracing::debug!(object = object.raw(), polygon = polygon.raw(), "polygon attached");
        Ok(())
    }

    // --- Object tree ---

    /// Adds an object under `parent`, or as a root when `parent` is `None`.
    ///
    /// The new object becomes the parent's first child. If its slot is
    /// being reused, links other objects still hold to the old occupant are
    /// cut first, so the new object starts with no incoming links.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotFound`] if `parent` is given but not valid.
    /// - [`ModelError::CapacityExhausted`] if the object table is full.
    pub fn add_object(&mut self, parent: Option<ObjectId>, offset: Vector3) -> Result<ObjectId> {
        if let Some(parent) = parent {
            if !self.objects.is_valid(parent) {
                return Err(parent.not_found().into());
            }
        }

        let id = self.objects.allocate(Object::new(offset))?;
        self.cut_links_to(id);
        if let Some(parent) = parent {
            self.link_first_child(parent, id);
        }
        self.mark_dirty();
        Ok(id)
    }

    /// Clears every parent, child and sibling link that names `id`.
    fn cut_links_to(&mut self, id: ObjectId) {
        let stale: Vec<_> = self
            .objects
            .iter()
            .filter(|&(other, record)| {
                other != id
                    && [record.parent(), record.child(), record.next_brother()].contains(&Some(id))
            })
            .map(|(other, _)| other)
            .collect();
        if stale.is_empty() {
            return;
        }

        tracing::debug!(object = id.raw(), holders = stale.len(), "stale tree links cut");
        for other in stale {
            let Some(record) = self.objects.get_mut(other) else {
                continue;
            };
            if record.parent() == Some(id) {
                record.set_parent(None);
            }
            if record.child() == Some(id) {
                record.set_child(None);
            }
            if record.next_brother() == Some(id) {
                record.set_next_brother(None);
            }
        }
    }

    /// Makes `object` the first child of `parent`. The caller guarantees
    /// that nothing on `parent`'s child list leads back to `object`.
    fn link_first_child(&mut self, parent: ObjectId, object: ObjectId) {
        let head = self.first_child_of(parent).filter(|&head| head != object);
        if let Some(record) = self.objects.get_mut(object) {
            record.set_parent(Some(parent));
            record.set_next_brother(head);
        }
        if let Some(record) = self.objects.get_mut(parent) {
            record.set_child(Some(object));
        }
    }

    /// Returns `true` if `ancestor` is `object` or lies on its parent path.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::BrokenChain`] if the parent path does not end
    /// within the table capacity.
    fn is_ancestor_or_self(
        &self,
        ancestor: ObjectId,
        object: ObjectId,
    ) -> std::result::Result<bool, ModelError> {
        let mut current = Some(object);
        for _ in 0..=self.objects.capacity() {
            let Some(id) = current else {
                return Ok(false);
            };
            if id == ancestor {
                return Ok(true);
            }
            current = self.objects.get(id).and_then(Object::parent);
        }
        Err(ModelError::BrokenChain {
            kind: EntityKind::Object,
            index: object.raw(),
        })
    }

    /// Moves an object, with its subtree, under `new_parent` (or to the
    /// root level). The object becomes the new parent's first child.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotFound`] if `object` or `new_parent` is not valid.
    /// - [`ModelError::InvalidArgument`] if `new_parent` is the object itself
    ///   or one of its descendants.
    /// - [`ModelError::BrokenChain`] if the new parent's ancestry loops.
    pub fn reparent_object(&mut self, object: ObjectId, new_parent: Option<ObjectId>) -> Result<()> {
        let record = self.objects.get(object).ok_or(object.not_found())?;
        let (old_parent, next_brother) = (record.parent(), record.next_brother());
        if let Some(parent) = new_parent {
            if !self.objects.is_valid(parent) {
                return Err(parent.not_found().into());
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(parent) = new_parent {
            if self.is_ancestor_or_self(object, parent)? {
                return Err(ModelError::InvalidArgument(format!(
                    "object #{} cannot move under its own subtree",
                    object.raw()
                ))
                .into());
            }
        }

        if let Some(old) = old_parent {
            self.unlink_child(old, object, next_brother);
        }
        match new_parent {
            Some(parent) => {
                // A dead old parent leaves the object linked from wherever a
                // stale sibling still names it, possibly the new list.
                self.unlink_child(parent, object, next_brother);
                self.link_first_child(parent, object);
            }
            None => {
                if let Some(record) = self.objects.get_mut(object) {
                    record.set_parent(None);
                    record.set_next_brother(None);
                }
            }
        }
        self.mark_dirty();
        tracing::debug!(object = object.raw(), parent = ?new_parent, "object reparented");
        Ok(())
    }

    /// Splices `object` out of `parent`'s child list. Does nothing if the
    /// parent is gone or the object is not reachable from it.
    fn unlink_child(&mut self, parent: ObjectId, object: ObjectId, next_brother: Option<ObjectId>) {
        let Some(first) = self.objects.get(parent).and_then(Object::child) else {
            return;
        };
        if first == object {
            if let Some(parent) = self.objects.get_mut(parent) {
                parent.set_child(next_brother);
            }
            return;
        }
        let previous = self
            .children(parent)
            .find(|&sibling| self.next_brother_of(sibling) == Some(object));
        if let Some(previous) = previous.and_then(|id| self.objects.get_mut(id)) {
            previous.set_next_brother(next_brother);
        }
    }
}
