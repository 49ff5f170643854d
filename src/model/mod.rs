mod arena;
pub mod chain;
pub mod mode;
pub mod object;
pub mod point;
pub mod polygon;
pub mod selection;

pub use arena::{Arena, EntityId, EntityKind};
pub use chain::Chain;
pub use mode::{EditMode, SelectionTarget};
pub use object::{Object, ObjectId};
pub use point::{Point, PointId};
pub use polygon::{Polygon, PolygonId};
pub use selection::{Selection, SelectionList};

use crate::error::Result;
use crate::math::{Point3, Vector3};
use crate::operations::query::{
    CoordinatesAreIntegral, DetectCoincidence, PointsAreMerged, ValidatePolygon,
};

/// Table capacities shared by every document.
pub mod limits {
    /// Point slots per document.
    pub const MAX_POINTS: usize = 8192;
    /// Polygon slots per document.
    pub const MAX_POLYGONS: usize = 8192;
    /// Object slots per document.
    pub const MAX_OBJECTS: usize = 512;
}

/// Indices remembered by incremental-build tools between calls.
///
/// The core only resets these on [`Document::clear`]; tools own their meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCursor {
    /// Polygon registered before the current one.
    pub root_polygon: Option<PolygonId>,
    /// Point registered before the current one.
    pub creating_point: Option<PointId>,
    /// First point of the ring being built.
    pub first_point: Option<PointId>,
}

/// Live-entity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Live points.
    pub points: usize,
    /// Live polygons.
    pub polygons: usize,
    /// Live objects.
    pub objects: usize,
}

/// The editable mesh document: three slot tables linked by index chains,
/// plus selection and edit-mode state.
///
/// A document is driven by a single caller. It has no internal locking; a
/// host sharing it across threads must serialize access itself.
///
/// Deleting an entity never patches links that point at it. Any id obtained
/// before a deletion must be re-checked with the matching `is_*_valid`
/// before use, since its slot may be free or reused. When an object slot is
/// reused, tree links still naming it are cut so the tree stays acyclic.
#[derive(Debug, Clone)]
pub struct Document {
    points: Arena<PointId, Point>,
    polygons: Arena<PolygonId, Polygon>,
    objects: Arena<ObjectId, Object>,
    selection: Selection,
    edit_mode: EditMode,
    cursor: BuildCursor,
    dirty: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document in [`EditMode::SelectPoint`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: Arena::with_capacity(limits::MAX_POINTS),
            polygons: Arena::with_capacity(limits::MAX_POLYGONS),
            objects: Arena::with_capacity(limits::MAX_OBJECTS),
            selection: Selection::new(limits::MAX_POINTS, limits::MAX_POLYGONS),
            edit_mode: EditMode::default(),
            cursor: BuildCursor::default(),
            dirty: false,
        }
    }

    /// Empties every table, the selection and the build cursor.
    ///
    /// The edit mode is kept. The document is clean afterwards.
    pub fn clear(&mut self) {
        self.points.clear();
        self.polygons.clear();
        self.objects.clear();
        self.selection.clear();
        self.cursor = BuildCursor::default();
        self.dirty = false;
        tracing::info!("document cleared");
    }

    /// Whether anything changed since the last clear, load or save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- Tables ---

    /// Read-only view of the point table.
    #[must_use]
    pub fn points(&self) -> &Arena<PointId, Point> {
        &self.points
    }

    /// Read-only view of the polygon table.
    #[must_use]
    pub fn polygons(&self) -> &Arena<PolygonId, Polygon> {
        &self.polygons
    }

    /// Read-only view of the object table.
    #[must_use]
    pub fn objects(&self) -> &Arena<ObjectId, Object> {
        &self.objects
    }

    pub(crate) fn points_mut(&mut self) -> &mut Arena<PointId, Point> {
        &mut self.points
    }

    pub(crate) fn polygons_mut(&mut self) -> &mut Arena<PolygonId, Polygon> {
        &mut self.polygons
    }

    pub(crate) fn objects_mut(&mut self) -> &mut Arena<ObjectId, Object> {
        &mut self.objects
    }

    /// Counts the live entities of each kind.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics {
            points: self.points.active_count(),
            polygons: self.polygons.active_count(),
            objects: self.objects.active_count(),
        }
    }

    /// Most recently allocated point.
    #[must_use]
    pub fn new_point(&self) -> Option<PointId> {
        self.points.last_allocated()
    }

    /// Most recently allocated polygon.
    #[must_use]
    pub fn new_polygon(&self) -> Option<PolygonId> {
        self.polygons.last_allocated()
    }

    /// Indices remembered by the build tools.
    #[must_use]
    pub fn cursor(&self) -> &BuildCursor {
        &self.cursor
    }

    /// Mutable access to the build cursor. Does not mark the document dirty.
    pub fn cursor_mut(&mut self) -> &mut BuildCursor {
        &mut self.cursor
    }

    // --- Point operations ---

    /// Adds an unlinked point.
    ///
    /// # Errors
    ///
    /// Returns an error if the point table is full.
    pub fn add_point(&mut self, position: Point3) -> Result<PointId> {
        let id = self.points.allocate(Point::new(position))?;
        self.mark_dirty();
        Ok(id)
    }

    /// Deletes a point and drops it from the selection.
    ///
    /// Rings that pass through the point are left as they are.
    pub fn remove_point(&mut self, id: PointId) -> bool {
        self.deselect_point(id);
        let freed = self.points.free(id);
        if freed {
            self.mark_dirty();
        }
        freed
    }

    /// Returns the point, or `None` if `id` is not valid.
    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.get(id)
    }

    /// Mutable access to a live point. Marks the document dirty.
    pub fn point_mut(&mut self, id: PointId) -> Option<&mut Point> {
        if self.points.is_valid(id) {
            self.dirty = true;
        }
        self.points.get_mut(id)
    }

    /// Returns `true` if `id` names a live point.
    #[must_use]
    pub fn is_point_valid(&self, id: PointId) -> bool {
        self.points.is_valid(id)
    }

    // --- Polygon operations ---

    /// Adds a polygon with an empty ring; grow it with
    /// [`append_point_to_polygon`](Self::append_point_to_polygon).
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon table is full.
    pub fn add_polygon(&mut self, color: u8) -> Result<PolygonId> {
        let id = self.polygons.allocate(Polygon::new(color))?;
        self.mark_dirty();
        Ok(id)
    }

    /// Deletes a polygon and drops it from the selection. Its points stay.
    pub fn remove_polygon(&mut self, id: PolygonId) -> bool {
        self.deselect_polygon(id);
        let freed = self.polygons.free(id);
        if freed {
            self.mark_dirty();
        }
        freed
    }

    /// Returns the polygon, or `None` if `id` is not valid.
    #[must_use]
    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.get(id)
    }

    /// Mutable access to a live polygon's metadata. Marks the document dirty.
    pub fn polygon_mut(&mut self, id: PolygonId) -> Option<&mut Polygon> {
        if self.polygons.is_valid(id) {
            self.dirty = true;
        }
        self.polygons.get_mut(id)
    }

    /// Returns `true` if `id` names a live polygon.
    #[must_use]
    pub fn is_polygon_valid(&self, id: PolygonId) -> bool {
        self.polygons.is_valid(id)
    }

    // --- Object operations ---

    /// Deletes an object. Its children, siblings and polygons keep their
    /// links to it.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let freed = self.objects.free(id);
        if freed {
            self.mark_dirty();
        }
        freed
    }

    /// Returns the object, or `None` if `id` is not valid.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    /// Mutable access to a live object's offset. Marks the document dirty.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        if self.objects.is_valid(id) {
            self.dirty = true;
        }
        self.objects.get_mut(id)
    }

    /// Returns `true` if `id` names a live object.
    #[must_use]
    pub fn is_object_valid(&self, id: ObjectId) -> bool {
        self.objects.is_valid(id)
    }

    /// Convenience for [`add_object`](Self::add_object) at the origin of its
    /// parent.
    ///
    /// # Errors
    ///
    /// See [`add_object`](Self::add_object).
    pub fn add_root_object(&mut self) -> Result<ObjectId> {
        self.add_object(None, Vector3::zeros())
    }

    // --- Edit mode ---

    /// The active edit mode.
    #[must_use]
    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Switches to `mode`. Any mode may follow any other; the selection is
    /// kept.
    pub fn set_edit_mode(&mut self, mode: EditMode) {
        tracing::debug!(?mode, "edit mode changed");
        self.edit_mode = mode;
    }

    /// Which entity kind the current mode operates on.
    #[must_use]
    pub fn selection_target(&self) -> SelectionTarget {
        self.edit_mode.target()
    }

    // --- Validation ---

    /// Returns `true` if the polygon's ring holds exactly its declared
    /// number of live points, and at least three.
    #[must_use]
    pub fn validate_polygon(&self, id: PolygonId) -> bool {
        ValidatePolygon::new(id).execute(self)
    }

    /// A point is valid if it exists.
    #[must_use]
    pub fn validate_point(&self, id: PointId) -> bool {
        self.points.is_valid(id)
    }

    // --- Merge detection ---

    /// Returns `true` if every live point sits on the integer grid.
    #[must_use]
    pub fn coordinates_are_integral(&self) -> bool {
        CoordinatesAreIntegral::new().execute(self)
    }

    /// Returns `true` if no two live points snap to the same grid cell.
    #[must_use]
    pub fn points_are_merged(&self) -> bool {
        PointsAreMerged::new().execute(self)
    }

    /// Returns `true` if the mesh is snapped and welded.
    #[must_use]
    pub fn is_fully_merged(&self) -> bool {
        DetectCoincidence::new().execute(self).is_clean()
    }
}
