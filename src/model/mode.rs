use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Editor mode. Any mode may follow any other.
///
/// The discriminants are the persisted codes; they are opaque labels, not
/// an ordered range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EditMode {
    #[default]
    SelectPoint = 0,
    SelectPolygon = 1,
    EditPoint = 2,
    EditPolygon = 11,
}

/// The entity kind that selection and editing commands apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionTarget {
    Points,
    Polygons,
}

impl EditMode {
    /// The kind this mode operates on.
    #[must_use]
    pub const fn target(self) -> SelectionTarget {
        match self {
            Self::SelectPoint | Self::EditPoint => SelectionTarget::Points,
            Self::SelectPolygon | Self::EditPolygon => SelectionTarget::Polygons,
        }
    }

    /// Persisted code of the mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EditMode {
    type Error = ModelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::SelectPoint),
            1 => Ok(Self::SelectPolygon),
            2 => Ok(Self::EditPoint),
            11 => Ok(Self::EditPolygon),
            other => Err(ModelError::InvalidArgument(format!(
                "unknown edit mode code {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_derived_from_mode() {
        assert_eq!(EditMode::SelectPoint.target(), SelectionTarget::Points);
        assert_eq!(EditMode::EditPoint.target(), SelectionTarget::Points);
        assert_eq!(EditMode::SelectPolygon.target(), SelectionTarget::Polygons);
        assert_eq!(EditMode::EditPolygon.target(), SelectionTarget::Polygons);
    }

    #[test]
    fn codes_keep_their_gap() {
        for mode in [
            EditMode::SelectPoint,
            EditMode::SelectPolygon,
            EditMode::EditPoint,
            EditMode::EditPolygon,
        ] {
            assert_eq!(EditMode::try_from(mode.code()), Ok(mode));
        }
        assert_eq!(EditMode::EditPolygon.code(), 11);
        assert!(EditMode::try_from(3).is_err());
    }
}
