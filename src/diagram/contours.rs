use crate::diagram::axes::polar_to_cartesian;
use crate::processing::metrics::centered_rms;

/// Mesh resolution (nodes per dimension) for the RMS contour field.
pub const MESH_RESOLUTION: usize = 50;

/// How iso-line levels are chosen.
#[derive(Debug, Clone)]
pub enum ContourLevels {
    /// N evenly spaced values strictly inside the field's (min, max).
    Count(usize),
    /// Explicit RMS values; out-of-range entries are dropped.
    Explicit(Vec<f64>),
}

/// One iso-RMS line: its level, the extracted polylines in Cartesian data
/// coordinates, and an anchor where the inline numeric label goes.
#[derive(Debug, Clone)]
pub struct ContourLine {
    pub level: f64,
    pub paths: Vec<Vec<[f64; 2]>>,
    pub label_anchor: Option<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct ContourSet {
    pub lines: Vec<ContourLine>,
}

/// The centered-RMS field sampled on a regular (angle, radius) mesh.
/// Values are stored angle-major: `values[j * radii.len() + i]` is the RMS
/// at `(angles[j], radii[i])`.
#[derive(Debug, Clone)]
pub struct RmsField {
    radii: Vec<f64>,
    angles: Vec<f64>,
    values: Vec<f64>,
}

impl RmsField {
    /// Sample `sqrt(ref_std^2 + r^2 - 2 * ref_std * r * cos(theta))` over
    /// radius in [smin, smax] x angle in [0, tmax].
    pub fn sample(ref_std: f64, smin: f64, smax: f64, tmax: f64, resolution: usize) -> Self {
        let n = resolution.max(2);
        let radii: Vec<f64> = (0..n)
            .map(|i| smin + (smax - smin) * i as f64 / (n - 1) as f64)
            .collect();
        let angles: Vec<f64> = (0..n)
            .map(|j| tmax * j as f64 / (n - 1) as f64)
            .collect();

        let mut values = Vec::with_capacity(n * n);
        for &theta in &angles {
            let cos_t = theta.cos();
            for &r in &radii {
                values.push(centered_rms(ref_std, r, cos_t));
            }
        }

        Self { radii, angles, values }
    }

    fn value(&self, j: usize, i: usize) -> f64 {
        self.values[j * self.radii.len() + i]
    }

    pub fn min_max(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.values {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        (min, max)
    }

    /// Extract the iso-line at `level` with marching squares on the
    /// (angle, radius) mesh, chaining cell segments into polylines and
    /// converting to Cartesian coordinates.
    pub fn extract(&self, level: f64) -> Vec<Vec<[f64; 2]>> {
        let nr = self.radii.len();
        let na = self.angles.len();
        let mut segments: Vec<([f64; 2], [f64; 2])> = Vec::new();

        for j in 0..na - 1 {
            for i in 0..nr - 1 {
                // Cell corners in (radius, angle) parameter space.
                let v = [
                    self.value(j, i),         // bottom-left
                    self.value(j, i + 1),     // bottom-right
                    self.value(j + 1, i + 1), // top-right
                    self.value(j + 1, i),     // top-left
                ];
                let corners = [
                    (self.radii[i], self.angles[j]),
                    (self.radii[i + 1], self.angles[j]),
                    (self.radii[i + 1], self.angles[j + 1]),
                    (self.radii[i], self.angles[j + 1]),
                ];

                let mut case = 0usize;
                for (bit, &val) in v.iter().enumerate() {
                    if val > level {
                        case |= 1 << bit;
                    }
                }
                if case == 0 || case == 15 {
                    continue;
                }

                // Crossing point on the edge between corners a and b.
                let cross = |a: usize, b: usize| -> [f64; 2] {
                    let (ra, ta) = corners[a];
                    let (rb, tb) = corners[b];
                    let denom = v[b] - v[a];
                    let t = if denom.abs() < f64::EPSILON {
                        0.5
                    } else {
                        ((level - v[a]) / denom).clamp(0.0, 1.0)
                    };
                    let r = ra + (rb - ra) * t;
                    let theta = ta + (tb - ta) * t;
                    polar_to_cartesian(theta, r)
                };

                // Edge e0: c0-c1, e1: c1-c2, e2: c2-c3, e3: c3-c0.
                let edge = |e: usize| -> [f64; 2] {
                    match e {
                        0 => cross(0, 1),
                        1 => cross(1, 2),
                        2 => cross(2, 3),
                        _ => cross(3, 0),
                    }
                };

                let center_above = (v[0] + v[1] + v[2] + v[3]) / 4.0 > level;
                let pairs: &[(usize, usize)] = match case {
                    1 => &[(3, 0)],
                    2 => &[(0, 1)],
                    3 => &[(3, 1)],
                    4 => &[(1, 2)],
                    5 => {
                        if center_above {
                            &[(2, 3), (0, 1)]
                        } else {
                            &[(3, 0), (1, 2)]
                        }
                    }
                    6 => &[(0, 2)],
                    7 => &[(3, 2)],
                    8 => &[(2, 3)],
                    9 => &[(0, 2)],
                    10 => {
                        if center_above {
                            &[(3, 0), (1, 2)]
                        } else {
                            &[(0, 1), (2, 3)]
                        }
                    }
                    11 => &[(1, 2)],
                    12 => &[(3, 1)],
                    13 => &[(0, 1)],
                    _ => &[(3, 0)], // 14
                };

                for &(a, b) in pairs {
                    segments.push((edge(a), edge(b)));
                }
            }
        }

        let tol = 1e-9 * self.radii.last().copied().unwrap_or(1.0).abs().max(1.0);
        chain_segments(segments, tol)
    }
}

/// `count` evenly spaced values strictly inside (min, max).
pub fn spaced_levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !(max - min).is_finite() || max <= min {
        return Vec::new();
    }
    let step = (max - min) / (count + 1) as f64;
    (1..=count).map(|i| min + step * i as f64).collect()
}

/// Compute the full contour set for a diagram domain.
pub fn compute_contours(
    ref_std: f64,
    smin: f64,
    smax: f64,
    tmax: f64,
    levels: &ContourLevels,
) -> ContourSet {
    let field = RmsField::sample(ref_std, smin, smax, tmax, MESH_RESOLUTION);
    let (min, max) = field.min_max();

    let level_values: Vec<f64> = match levels {
        ContourLevels::Count(n) => spaced_levels(min, max, *n),
        ContourLevels::Explicit(values) => {
            let mut vals: Vec<f64> = values
                .iter()
                .copied()
                .filter(|v| v.is_finite() && *v >= min && *v <= max)
                .collect();
            vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            vals.dedup();
            vals
        }
    };

    let lines = level_values
        .into_iter()
        .map(|level| {
            let paths = field.extract(level);
            let label_anchor = label_anchor(&paths);
            ContourLine { level, paths, label_anchor }
        })
        .collect();

    ContourSet { lines }
}

/// Label anchor: the midpoint vertex of the longest path.
fn label_anchor(paths: &[Vec<[f64; 2]>]) -> Option<[f64; 2]> {
    paths
        .iter()
        .max_by_key(|p| p.len())
        .and_then(|p| p.get(p.len() / 2))
        .copied()
}

/// Chain loose segments into polylines by joining matching endpoints.
/// Segments sharing a mesh edge interpolate to identical coordinates, so a
/// tight tolerance suffices.
fn chain_segments(mut segments: Vec<([f64; 2], [f64; 2])>, tol: f64) -> Vec<Vec<[f64; 2]>> {
    let close = |a: &[f64; 2], b: &[f64; 2]| -> bool {
        (a[0] - b[0]).abs() <= tol && (a[1] - b[1]).abs() <= tol
    };

    let mut paths: Vec<Vec<[f64; 2]>> = Vec::new();
    while let Some((p0, p1)) = segments.pop() {
        let mut path = vec![p0, p1];
        loop {
            let mut grew = false;

            let head = *path.first().unwrap();
            let tail = *path.last().unwrap();
            let mut idx = 0;
            while idx < segments.len() {
                let (a, b) = segments[idx];
                if close(&tail, &a) {
                    path.push(b);
                } else if close(&tail, &b) {
                    path.push(a);
                } else if close(&head, &a) {
                    path.insert(0, b);
                } else if close(&head, &b) {
                    path.insert(0, a);
                } else {
                    idx += 1;
                    continue;
                }
                segments.swap_remove(idx);
                grew = true;
                break;
            }

            if !grew {
                break;
            }
        }
        paths.push(path);
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn field_is_zero_at_reference_point() {
        let field = RmsField::sample(2.0, 0.0, 3.6, PI / 2.0, MESH_RESOLUTION);
        let (min, _) = field.min_max();
        // The mesh may not land exactly on (r = ref_std, theta = 0), but the
        // analytic identity must hold at the point itself.
        assert_eq!(centered_rms(2.0, 2.0, (0.0f64).cos()), 0.0);
        assert!(min >= 0.0);
    }

    #[test]
    fn spaced_levels_are_interior_and_increasing() {
        let levels = spaced_levels(0.0, 6.0, 5);
        assert_eq!(levels.len(), 5);
        for w in levels.windows(2) {
            assert!(w[1] > w[0]);
        }
        assert!(levels[0] > 0.0);
        assert!(*levels.last().unwrap() < 6.0);
    }

    #[test]
    fn spaced_levels_of_degenerate_range_are_empty() {
        assert!(spaced_levels(1.0, 1.0, 5).is_empty());
        assert!(spaced_levels(0.0, 6.0, 0).is_empty());
    }

    #[test]
    fn degenerate_reference_gives_circular_contours() {
        // With ref_std = 0 the field collapses to rms = r, which is linear
        // in radius, so marching squares interpolates it exactly: every
        // extracted vertex sits at radius == level.
        let field = RmsField::sample(0.0, 0.0, 2.0, PI / 2.0, 21);
        let paths = field.extract(1.0);
        assert!(!paths.is_empty());
        for path in &paths {
            assert!(path.len() >= 2);
            for p in path {
                let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
                assert!((r - 1.0).abs() < 1e-9, "vertex radius {r}");
            }
        }
    }

    #[test]
    fn contour_vertices_stay_inside_domain() {
        let set = compute_contours(174.0605, 0.0, 1.8 * 174.0605, PI / 2.0, &ContourLevels::Count(5));
        assert_eq!(set.lines.len(), 5);
        let smax = 1.8 * 174.0605;
        for line in &set.lines {
            assert!(!line.paths.is_empty(), "level {} has no paths", line.level);
            for path in &line.paths {
                for p in path {
                    let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
                    assert!(r <= smax * (1.0 + 1e-9));
                    assert!(p[1] >= -1e-9, "below angle 0: {p:?}");
                }
            }
        }
    }

    #[test]
    fn levels_increase_and_carry_label_anchors() {
        let set = compute_contours(2.0, 0.0, 3.6, PI / 2.0, &ContourLevels::Count(4));
        for w in set.lines.windows(2) {
            assert!(w[1].level > w[0].level);
        }
        for line in &set.lines {
            assert!(line.label_anchor.is_some());
        }
    }

    #[test]
    fn explicit_levels_are_filtered_to_field_range() {
        let set = compute_contours(
            2.0,
            0.0,
            3.6,
            PI / 2.0,
            &ContourLevels::Explicit(vec![1.0, 2.0, 99.0, -5.0, 2.0]),
        );
        let levels: Vec<f64> = set.lines.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![1.0, 2.0]);
    }

    #[test]
    fn chained_paths_have_no_duplicate_joints() {
        let field = RmsField::sample(2.0, 0.0, 3.6, PI / 2.0, MESH_RESOLUTION);
        let paths = field.extract(1.5);
        // Chaining must actually join segments: a 50x50 mesh produces far
        // fewer paths than raw segments.
        let total_vertices: usize = paths.iter().map(|p| p.len()).sum();
        assert!(paths.len() < total_vertices / 4, "{} paths", paths.len());
    }
}
