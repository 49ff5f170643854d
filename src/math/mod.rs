/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Snaps a coordinate to its integer grid cell, rounding halves up.
///
/// Ties go toward positive infinity: `0.5 -> 1`, `-0.5 -> 0`, `-1.5 -> -1`.
/// The result stays an `f64` so coordinates beyond the `i64` range keep
/// distinct cells; non-finite input is returned unchanged.
#[must_use]
pub fn quantize(coord: f64) -> f64 {
    let floor = coord.floor();
    // The difference may round, but never across one half.
    if coord - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Returns `true` if the coordinate equals its quantized value.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_on_grid(coord: f64) -> bool {
    coord.is_finite() && quantize(coord) == coord
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn quantize_rounds_half_up() {
        assert_eq!(quantize(0.5), 1.0);
        assert_eq!(quantize(0.49), 0.0);
        assert_eq!(quantize(-0.5), 0.0);
        assert_eq!(quantize(-1.5), -1.0);
        assert_eq!(quantize(-1.51), -2.0);
        assert_eq!(quantize(2.0), 2.0);
    }

    #[test]
    fn quantize_does_not_round_up_early() {
        assert_eq!(quantize(0.499_999_999_999_999_94), 0.0);
        assert_eq!(quantize(-0.500_000_000_000_000_1), -1.0);
    }

    #[test]
    fn large_integers_are_their_own_cell() {
        let big = 2f64.powi(52) + 1.0;
        assert_eq!(quantize(big), big);
        assert!(is_on_grid(big));
        assert_eq!(quantize(1e19), 1e19);
        assert_ne!(quantize(1e19), quantize(2e19));
        assert_eq!(quantize(-3e300), -3e300);
    }

    #[test]
    fn grid_membership() {
        assert!(is_on_grid(3.0));
        assert!(is_on_grid(-7.0));
        assert!(is_on_grid(-0.0));
        assert!(!is_on_grid(0.5));
        assert!(!is_on_grid(0.499_999_999_999_999_94));
        assert!(!is_on_grid(f64::NAN));
        assert!(!is_on_grid(f64::INFINITY));
    }
}
