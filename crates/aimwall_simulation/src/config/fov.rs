//! Horizontal → vertical FOV conversion
//!
//! Единственный путь от user-facing horizontal FOV к vertical FOV renderer'а.
//! Считаем в f64 по точной формуле: perceived sensitivity зависит от неё.

/// Aspect по умолчанию (fixed 16:9 canvas)
pub const DEFAULT_ASPECT: f64 = 16.0 / 9.0;

/// `vfov = 2 · atan(tan(hfov / 2) / aspect)`, градусы → градусы
///
/// Невалидный aspect (≤ 0, NaN, inf) заменяется на `DEFAULT_ASPECT`.
pub fn horizontal_to_vertical_fov(hfov_deg: f64, aspect: f64) -> f64 {
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        DEFAULT_ASPECT
    };
    let half_h = hfov_deg.to_radians() / 2.0;
    (2.0 * (half_h.tan() / aspect).atan()).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_value_16_9() {
        // tan(53°) · 9/16 = 0.74646 → atan = 36.740° → 73.480°
        let vfov = horizontal_to_vertical_fov(106.0, 16.0 / 9.0);
        assert!((vfov - 73.48).abs() < 0.01, "vfov = {}", vfov);
    }

    #[test]
    fn test_square_aspect_is_identity() {
        for hfov in [30.0, 90.0, 120.0] {
            assert!((horizontal_to_vertical_fov(hfov, 1.0) - hfov).abs() < 1e-9);
        }
    }

    #[test]
    fn test_monotonic_over_open_interval() {
        let mut previous = horizontal_to_vertical_fov(0.5, DEFAULT_ASPECT);
        let mut hfov = 1.0;
        while hfov < 180.0 {
            let vfov = horizontal_to_vertical_fov(hfov, DEFAULT_ASPECT);
            assert!(vfov > previous, "not increasing at hfov={}", hfov);
            previous = vfov;
            hfov += 0.5;
        }
    }

    #[test]
    fn test_invalid_aspect_falls_back() {
        let expected = horizontal_to_vertical_fov(106.0, DEFAULT_ASPECT);
        assert_eq!(horizontal_to_vertical_fov(106.0, 0.0), expected);
        assert_eq!(horizontal_to_vertical_fov(106.0, f64::NAN), expected);
    }
}
