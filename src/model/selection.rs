use super::{Arena, Document, EntityId, PointId, PolygonId, SelectionTarget};

/// Selected ids of one kind, oldest first.
///
/// Membership mirrors the per-slot selection flag: every path that sets or
/// clears the flag updates this list in the same call.
#[derive(Debug, Clone)]
pub struct SelectionList<K> {
    order: Vec<K>,
    capacity: usize,
}

impl<K: EntityId> SelectionList<K> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::new(),
            capacity,
        }
    }

    /// Selected ids in the order they were selected.
    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.order.contains(&id)
    }

    /// The most recently selected id.
    #[must_use]
    pub fn last(&self) -> Option<K> {
        self.order.last().copied()
    }

    fn push(&mut self, id: K) -> bool {
        if self.order.len() >= self.capacity {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Removes `id`, keeping the relative order of the rest.
    fn remove(&mut self, id: K) -> bool {
        match self.order.iter().position(|&k| k == id) {
            Some(at) => {
                self.order.remove(at);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

/// Ordered point and polygon selections.
#[derive(Debug, Clone)]
pub struct Selection {
    points: SelectionList<PointId>,
    polygons: SelectionList<PolygonId>,
}

impl Selection {
    pub(crate) fn new(point_capacity: usize, polygon_capacity: usize) -> Self {
        Self {
            points: SelectionList::with_capacity(point_capacity),
            polygons: SelectionList::with_capacity(polygon_capacity),
        }
    }

    /// Selected points, oldest first.
    #[must_use]
    pub fn points(&self) -> &[PointId] {
        self.points.as_slice()
    }

    /// Selected polygons, oldest first.
    #[must_use]
    pub fn polygons(&self) -> &[PolygonId] {
        self.polygons.as_slice()
    }

    #[must_use]
    pub fn point_list(&self) -> &SelectionList<PointId> {
        &self.points
    }

    #[must_use]
    pub fn polygon_list(&self) -> &SelectionList<PolygonId> {
        &self.polygons
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.polygons.clear();
    }
}

fn select_in<K: EntityId, T>(arena: &mut Arena<K, T>, list: &mut SelectionList<K>, id: K) {
    if !arena.is_valid(id) || arena.is_selected(id) {
        return;
    }
    if list.push(id) {
        arena.set_selected(id, true);
    }
}

fn deselect_in<K: EntityId, T>(arena: &mut Arena<K, T>, list: &mut SelectionList<K>, id: K) {
    if arena.set_selected(id, false) {
        list.remove(id);
    }
}

impl Document {
    /// Ordered point and polygon selections.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Adds a live point to the end of the point selection. Does nothing if
    /// the point is not valid or already selected.
    pub fn select_point(&mut self, id: PointId) {
        select_in(&mut self.points, &mut self.selection.points, id);
    }

    /// Adds a live polygon to the end of the polygon selection.
    pub fn select_polygon(&mut self, id: PolygonId) {
        select_in(&mut self.polygons, &mut self.selection.polygons, id);
    }

    /// Removes a point from the selection, keeping the order of the rest.
    pub fn deselect_point(&mut self, id: PointId) {
        deselect_in(&mut self.points, &mut self.selection.points, id);
    }

    pub fn deselect_polygon(&mut self, id: PolygonId) {
        deselect_in(&mut self.polygons, &mut self.selection.polygons, id);
    }

    /// Reads the point's selection flag; `false` for invalid ids.
    #[must_use]
    pub fn is_point_selected(&self, id: PointId) -> bool {
        self.points.is_selected(id)
    }

    /// Reads the polygon's selection flag.
    #[must_use]
    pub fn is_polygon_selected(&self, id: PolygonId) -> bool {
        self.polygons.is_selected(id)
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        self.points.clear_selected();
        self.polygons.clear_selected();
        self.selection.clear();
    }

    /// Selects every live entity of the kind the edit mode targets, in
    /// ascending id order after anything already selected.
    pub fn select_all(&mut self) {
        match self.selection_target() {
            SelectionTarget::Points => {
                let ids: Vec<_> = self.points.ids().collect();
                for id in ids {
                    self.select_point(id);
                }
            }
            SelectionTarget::Polygons => {
                let ids: Vec<_> = self.polygons.ids().collect();
                for id in ids {
                    self.select_polygon(id);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::model::EditMode;

    fn doc_with_points(n: u16) -> Document {
        let mut doc = Document::new();
        for i in 0..n {
            doc.add_point(Point3::new(f64::from(i), 0.0, 0.0)).unwrap();
        }
        doc
    }

    fn pt(raw: u16) -> PointId {
        PointId::new(raw)
    }

    fn assert_points_in_sync(doc: &Document) {
        for raw in 0..8 {
            let id = pt(raw);
            assert_eq!(
                doc.is_point_selected(id),
                doc.selection().point_list().contains(id),
                "flag and list disagree for point #{raw}"
            );
        }
        for &id in doc.selection().points() {
            assert!(doc.is_point_valid(id));
        }
    }

    #[test]
    fn selection_keeps_insertion_order() {
        let mut doc = doc_with_points(5);
        doc.select_point(pt(3));
        doc.select_point(pt(1));
        doc.select_point(pt(4));
        assert_eq!(doc.selection().points(), &[pt(3), pt(1), pt(4)]);
        assert_eq!(doc.selection().point_list().last(), Some(pt(4)));

        doc.deselect_point(pt(1));
        assert_eq!(doc.selection().points(), &[pt(3), pt(4)]);
        assert_points_in_sync(&doc);
    }

    #[test]
    fn reselecting_is_a_no_op() {
        let mut doc = doc_with_points(2);
        doc.select_point(pt(0));
        doc.select_point(pt(1));
        doc.select_point(pt(0));
        assert_eq!(doc.selection().points(), &[pt(0), pt(1)]);
    }

    #[test]
    fn invalid_ids_are_ignored() {
        let mut doc = doc_with_points(2);
        doc.select_point(pt(6));
        doc.select_polygon(PolygonId::new(0));
        doc.deselect_point(pt(7));
        assert!(doc.selection().points().is_empty());
        assert!(doc.selection().polygons().is_empty());
        assert!(!doc.is_point_selected(pt(6)));
    }

    #[test]
    fn removing_a_point_drops_it_from_selection() {
        let mut doc = doc_with_points(4);
        doc.select_point(pt(2));
        doc.select_point(pt(0));
        doc.select_point(pt(3));
        doc.remove_point(pt(0));
        assert_eq!(doc.selection().points(), &[pt(2), pt(3)]);

        let reused = doc.add_point(Point3::origin()).unwrap();
        assert_eq!(reused, pt(0));
        assert!(!doc.is_point_selected(reused));
        assert_points_in_sync(&doc);
    }

    #[test]
    fn flags_and_list_stay_in_sync_under_mixed_edits() {
        let mut doc = doc_with_points(8);
        let script: [(char, u16); 12] = [
            ('s', 5),
            ('s', 2),
            ('f', 5),
            ('s', 7),
            ('d', 2),
            ('s', 2),
            ('s', 5),
            ('f', 7),
            ('s', 0),
            ('d', 6),
            ('s', 1),
            ('f', 0),
        ];
        for (op, raw) in script {
            match op {
                's' => doc.select_point(pt(raw)),
                'd' => doc.deselect_point(pt(raw)),
                _ => {
                    doc.remove_point(pt(raw));
                }
            }
            assert_points_in_sync(&doc);
        }
        assert_eq!(doc.selection().points(), &[pt(2), pt(5), pt(1)]);
    }

    #[test]
    fn select_all_follows_edit_mode() {
        let mut doc = doc_with_points(3);
        doc.add_polygon(0).unwrap();
        doc.add_polygon(0).unwrap();
        doc.remove_point(pt(1));

        doc.select_point(pt(2));
        doc.set_edit_mode(EditMode::EditPoint);
        doc.select_all();
        assert_eq!(doc.selection().points(), &[pt(2), pt(0)]);
        assert!(doc.selection().polygons().is_empty());

        doc.set_edit_mode(EditMode::EditPolygon);
        doc.select_all();
        assert_eq!(
            doc.selection().polygons(),
            &[PolygonId::new(0), PolygonId::new(1)]
        );
    }

    #[test]
    fn clear_selection_resets_both_kinds() {
        let mut doc = doc_with_points(3);
        let poly = doc.add_polygon(0).unwrap();
        doc.select_all();
        doc.select_polygon(poly);
        doc.clear_selection();
        assert!(doc.selection().points().is_empty());
        assert!(doc.selection().polygons().is_empty());
        assert!(!doc.is_polygon_selected(poly));
        assert_points_in_sync(&doc);
    }

    #[test]
    fn full_list_refuses_without_setting_flag() {
        let mut list = SelectionList::with_capacity(1);
        assert!(list.push(pt(0)));
        assert!(!list.push(pt(1)));
        assert_eq!(list.len(), 1);
        assert!(!list.remove(pt(1)));
        assert!(list.remove(pt(0)));
        assert!(list.is_empty());
    }
}
