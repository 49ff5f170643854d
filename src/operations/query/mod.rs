mod merge;
mod validate;

pub use merge::{CoordinatesAreIntegral, DetectCoincidence, MergeReport, PointsAreMerged};
pub use validate::{CheckStructure, StructureReport, ValidatePolygon};
