//! Boundary to the file-format collaborator.
//!
//! The core never touches the file system itself. A [`DocumentStorage`]
//! implementation turns paths into [`DocumentData`] snapshots and back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BoxError, Result, StorageError};
use crate::model::{limits, Document, Object, Point, Polygon};
use crate::operations::query::CheckStructure;

/// Plain copy of a document's tables.
///
/// Each table is indexed by slot; its length is the table's high-water mark
/// and free slots are `None`. Selection state is not part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub points: Vec<Option<Point>>,
    pub polygons: Vec<Option<Polygon>>,
    pub objects: Vec<Option<Object>>,
}

impl DocumentData {
    fn check_capacity(&self) -> std::result::Result<(), StorageError> {
        let tables = [
            ("point", self.points.len(), limits::MAX_POINTS),
            ("polygon", self.polygons.len(), limits::MAX_POLYGONS),
            ("object", self.objects.len(), limits::MAX_OBJECTS),
        ];
        for (name, len, capacity) in tables {
            if len > capacity {
                return Err(StorageError::Snapshot(format!(
                    "{len} {name} slots exceed the capacity of {capacity}"
                )));
            }
        }
        Ok(())
    }
}

/// Reads and writes document snapshots.
pub trait DocumentStorage {
    /// Reads the snapshot stored at `path`.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying format or medium.
    fn load(&self, path: &Path) -> std::result::Result<DocumentData, BoxError>;

    /// Writes `data` to `path`.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying format or medium.
    fn save(&self, path: &Path, data: &DocumentData) -> std::result::Result<(), BoxError>;
}

impl Document {
    /// Copies the tables out.
    #[must_use]
    pub fn snapshot(&self) -> DocumentData {
        DocumentData {
            points: self.points().to_table(),
            polygons: self.polygons().to_table(),
            objects: self.objects().to_table(),
        }
    }

    /// Builds a clean document from a snapshot.
    ///
    /// Links are taken as stored. Every walk stays bounded by the table
    /// capacities, and a [`CheckStructure`] pass logs a warning for rings or
    /// object links that do not hold up.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Snapshot`] if a table exceeds its capacity.
    pub fn from_snapshot(data: DocumentData) -> Result<Self> {
        let mut doc = Self::new();
        doc.install(data)?;
        Ok(doc)
    }

    fn install(&mut self, data: DocumentData) -> Result<()> {
        data.check_capacity()?;
        let DocumentData {
            points,
            polygons,
            objects,
        } = data;
        self.clear();
        self.points_mut().load_table(points)?;
        self.polygons_mut().load_table(polygons)?;
        self.objects_mut().load_table(objects)?;
        self.mark_clean();
        // Loaded links are kept as they are; problems are only reported.
        let report = CheckStructure::new().execute(self);
        tracing::debug!(clean = report.is_clean(), "snapshot structure checked");
        Ok(())
    }

    /// Replaces the document with the snapshot stored at `path`.
    ///
    /// The document is cleared first and stays empty if loading fails.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Load`] if `storage` fails.
    /// - [`StorageError::Snapshot`] if the snapshot does not fit.
    pub fn load<S>(&mut self, storage: &S, path: impl AsRef<Path>) -> Result<()>
    where
        S: DocumentStorage + ?Sized,
    {
        let path = path.as_ref();
        self.clear();
        let data = storage.load(path).map_err(|source| StorageError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        self.install(data)?;
        tracing::info!(path = %path.display(), stats = ?self.statistics(), "document loaded");
        Ok(())
    }

    /// Writes the document to `path` and marks it clean.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Save`] if `storage` fails; the dirty flag is
    /// left as it was.
    pub fn save<S>(&mut self, storage: &S, path: impl AsRef<Path>) -> Result<()>
    where
        S: DocumentStorage + ?Sized,
    {
        let path = path.as_ref();
        storage
            .save(path, &self.snapshot())
            .map_err(|source| StorageError::Save {
                path: path.to_path_buf(),
                source,
            })?;
        self.mark_clean();
        tracing::info!(path = %path.display(), "document saved");
        Ok(())
    }
}
