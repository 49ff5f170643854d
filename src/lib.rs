pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod operations;

pub use error::{PolycadError, Result};
pub use io::{DocumentData, DocumentStorage};
pub use model::{Document, EditMode, ObjectId, PointId, PolygonId};
