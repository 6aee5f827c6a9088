use std::f64::consts::PI;

/// Correlation values marked on the angular axis. These are the fixed
/// reference positions of a Taylor diagram; the uneven spacing reflects
/// arccos compressing high correlations into a narrow angular band.
pub const CORRELATION_TICKS: [f64; 10] = [0.0, 0.2, 0.3, 0.4, 0.6, 0.8, 0.9, 0.95, 0.99, 1.0];

/// Segments used when sampling an arc into a polyline.
pub const ARC_SEGMENTS: usize = 100;

/// Convert a correlation coefficient to its polar angle.
///
/// The input is clamped to [-1, 1] first so that floating-point overshoot
/// (e.g. 1.0000000000000002 from a correlation of a series with itself)
/// cannot produce a NaN angle. A genuine NaN correlation still propagates.
pub fn correlation_to_angle(correlation: f64) -> f64 {
    correlation.clamp(-1.0, 1.0).acos()
}

/// Map polar (angle, radius) to Cartesian diagram coordinates.
/// Angle 0 lies along the positive x-axis; the quadrant opens upward.
pub fn polar_to_cartesian(angle: f64, radius: f64) -> [f64; 2] {
    [radius * angle.cos(), radius * angle.sin()]
}

/// Angular extent of the diagram: a quarter circle for correlations in
/// [0, 1], a half circle when extended to negative correlations.
pub fn angular_extent(extend_negative: bool) -> f64 {
    if extend_negative {
        PI
    } else {
        PI / 2.0
    }
}

/// The (correlation, angle) pairs marked on the angular axis, ordered by
/// angle. With `extend_negative` the tick set is mirrored into negative
/// correlations (zero is not duplicated).
pub fn correlation_tick_angles(extend_negative: bool) -> Vec<(f64, f64)> {
    let mut ticks: Vec<f64> = CORRELATION_TICKS.to_vec();
    if extend_negative {
        for &c in CORRELATION_TICKS.iter().skip(1) {
            ticks.push(-c);
        }
    }
    let mut pairs: Vec<(f64, f64)> = ticks
        .into_iter()
        .map(|c| (c, correlation_to_angle(c)))
        .collect();
    pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// Sample an arc at constant radius into a polyline.
pub fn arc_points(radius: f64, theta0: f64, theta1: f64, segments: usize) -> Vec<[f64; 2]> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = theta0 + (theta1 - theta0) * i as f64 / segments as f64;
            polar_to_cartesian(t, radius)
        })
        .collect()
}

/// Compute tick positions for the standard-deviation axis.
/// Returns values at a "nice" step covering [smin, smax].
pub fn std_axis_ticks(smin: f64, smax: f64) -> Vec<f64> {
    let range = smax - smin;
    if range <= 0.0 || !range.is_finite() {
        return Vec::new();
    }

    let raw_step = range / 5.0;
    let order = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / order;

    let nice_step = if normalized <= 1.0 {
        order
    } else if normalized <= 2.0 {
        2.0 * order
    } else if normalized <= 5.0 {
        5.0 * order
    } else {
        10.0 * order
    };

    let start = (smin / nice_step).ceil() as i64;
    let end = (smax / nice_step).floor() as i64;

    (start..=end).map(|i| i as f64 * nice_step).collect()
}

/// Format a numeric value for axis tick labels.
pub fn format_tick_value(val: f64) -> String {
    if val.abs() >= 1e6 || (val != 0.0 && val.abs() < 1e-3) {
        format!("{val:.2e}")
    } else if val == 0.0 {
        "0".to_string()
    } else {
        let s = format!("{val:.6}");
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}

/// Format a correlation tick label: "0.95", "1", "-0.6".
pub fn format_correlation(c: f64) -> String {
    format_tick_value(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_of_perfect_correlation_is_zero() {
        assert_eq!(correlation_to_angle(1.0), 0.0);
    }

    #[test]
    fn overshoot_is_clamped_not_nan() {
        let angle = correlation_to_angle(1.0 + 1e-12);
        assert_eq!(angle, 0.0);
        let angle = correlation_to_angle(-1.0 - 1e-12);
        assert!((angle - PI).abs() < 1e-12);
    }

    #[test]
    fn nan_correlation_propagates() {
        assert!(correlation_to_angle(f64::NAN).is_nan());
    }

    #[test]
    fn angle_of_cmip6_scenario_correlation() {
        assert!((correlation_to_angle(0.9) - 0.4510).abs() < 1e-4);
    }

    #[test]
    fn positive_correlations_map_into_first_quadrant() {
        for c in [0.0, 0.2, 0.5, 0.9, 1.0] {
            let angle = correlation_to_angle(c);
            assert!((0.0..=PI / 2.0).contains(&angle), "corr {c} -> angle {angle}");
        }
    }

    #[test]
    fn negative_correlations_map_past_quarter_circle() {
        for c in [-0.1, -0.5, -1.0] {
            let angle = correlation_to_angle(c);
            assert!(angle > PI / 2.0 && angle <= PI, "corr {c} -> angle {angle}");
        }
    }

    #[test]
    fn tick_set_is_mirrored_when_extended() {
        let plain = correlation_tick_angles(false);
        assert_eq!(plain.len(), CORRELATION_TICKS.len());
        let extended = correlation_tick_angles(true);
        assert_eq!(extended.len(), CORRELATION_TICKS.len() * 2 - 1);
        // Ordered by angle: +1 first, -1 last.
        assert_eq!(extended.first().unwrap().0, 1.0);
        assert_eq!(extended.last().unwrap().0, -1.0);
        // Zero appears exactly once.
        let zeros = extended.iter().filter(|(c, _)| *c == 0.0).count();
        assert_eq!(zeros, 1);
    }

    #[test]
    fn arc_endpoints_match_requested_angles() {
        let pts = arc_points(2.0, 0.0, PI / 2.0, 10);
        assert_eq!(pts.len(), 11);
        let first = pts.first().unwrap();
        let last = pts.last().unwrap();
        assert!((first[0] - 2.0).abs() < 1e-12 && first[1].abs() < 1e-12);
        assert!(last[0].abs() < 1e-12 && (last[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn std_ticks_cover_range_with_round_steps() {
        let ticks = std_axis_ticks(0.0, 313.3);
        assert!(!ticks.is_empty());
        assert!(ticks.iter().all(|&t| (0.0..=313.3).contains(&t)));
        // Round step: consecutive differences equal.
        let step = ticks[1] - ticks[0];
        for w in ticks.windows(2) {
            assert!((w[1] - w[0] - step).abs() < 1e-9);
        }
    }

    #[test]
    fn degenerate_std_range_yields_no_ticks() {
        assert!(std_axis_ticks(1.0, 1.0).is_empty());
        assert!(std_axis_ticks(2.0, 1.0).is_empty());
    }

    #[test]
    fn tick_labels_are_trimmed() {
        assert_eq!(format_tick_value(0.95), "0.95");
        assert_eq!(format_tick_value(1.0), "1");
        assert_eq!(format_tick_value(0.0), "0");
        assert_eq!(format_correlation(-0.6), "-0.6");
    }
}
