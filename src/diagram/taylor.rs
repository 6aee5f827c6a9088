use crate::diagram::axes::{
    self, arc_points, correlation_to_angle, polar_to_cartesian, ARC_SEGMENTS,
};
use crate::diagram::contours::{compute_contours, ContourLevels, ContourSet};
use crate::diagram::figure::{DiagramFigure, LineStroke, TextAnchor};
use crate::diagram::style::MarkerStyle;

/// One plotted point on the diagram, kept in insertion order. The first
/// entry is always the reference point; the legend is assembled from this
/// collection.
#[derive(Debug, Clone)]
pub struct SamplePoint {
    pub std_dev: f64,
    pub correlation: f64,
    /// Polar angle, `arccos(correlation)` after clamping to [-1, 1].
    pub angle: f64,
    pub style: MarkerStyle,
}

/// Colors the figure assembly takes from the surrounding theme.
#[derive(Debug, Clone, Copy)]
pub struct FigurePalette {
    pub axis: [u8; 4],
    pub tick_label: [u8; 4],
    pub grid: [u8; 4],
    pub contour: [u8; 4],
}

/// Taylor diagram state: a single-quadrant (or, extended, half-plane) polar
/// coordinate system with radius = standard deviation and angle =
/// arccos(correlation).
///
/// Lifecycle is strictly forward: construct (axes fixed), then add samples,
/// then optionally overlay grid and contours, then assemble a figure.
/// There is no way back; build a new value to restart.
#[derive(Debug, Clone)]
pub struct TaylorDiagram {
    ref_std: f64,
    smin: f64,
    smax: f64,
    tmax: f64,
    /// (correlation, angle) pairs marking the angular axis.
    corr_ticks: Vec<(f64, f64)>,
    /// Tick values along the standard-deviation axis.
    std_ticks: Vec<f64>,
    samples: Vec<SamplePoint>,
    grid: Option<Vec<Vec<[f64; 2]>>>,
    contours: Option<ContourSet>,
}

impl TaylorDiagram {
    /// Set up the diagram axes around a reference standard deviation.
    ///
    /// `std_range` bounds the radial axis in units of `ref_std` (so the
    /// default (0, 1.8) spans zero to 1.8 reference deviations). With
    /// `extend_negative` the angular domain covers negative correlations
    /// down to -1 (half circle); otherwise it is limited to [0, 1].
    ///
    /// The reference point is plotted at (angle 0, radius `ref_std`) under
    /// `ref_style` and becomes the first legend entry; a dashed arc at
    /// constant radius `ref_std` marks it across the angular domain.
    pub fn new(
        ref_std: f64,
        std_range: (f64, f64),
        extend_negative: bool,
        ref_style: MarkerStyle,
    ) -> Result<Self, String> {
        if !ref_std.is_finite() || ref_std <= 0.0 {
            return Err(format!(
                "Reference standard deviation must be finite and positive, got {ref_std}"
            ));
        }
        if !std_range.0.is_finite() || !std_range.1.is_finite() {
            return Err(format!(
                "Stddev axis range must be finite, got ({}, {})",
                std_range.0, std_range.1
            ));
        }
        if std_range.0 < 0.0 || std_range.1 <= std_range.0 {
            return Err(format!(
                "Stddev axis range must satisfy 0 <= min < max, got ({}, {})",
                std_range.0, std_range.1
            ));
        }

        let smin = std_range.0 * ref_std;
        let smax = std_range.1 * ref_std;
        let tmax = axes::angular_extent(extend_negative);

        let reference = SamplePoint {
            std_dev: ref_std,
            correlation: 1.0,
            angle: 0.0,
            style: ref_style,
        };

        Ok(Self {
            ref_std,
            smin,
            smax,
            tmax,
            corr_ticks: axes::correlation_tick_angles(extend_negative),
            std_ticks: axes::std_axis_ticks(smin, smax),
            samples: vec![reference],
            grid: None,
            contours: None,
        })
    }

    pub fn ref_std(&self) -> f64 {
        self.ref_std
    }

    pub fn smin(&self) -> f64 {
        self.smin
    }

    pub fn smax(&self) -> f64 {
        self.smax
    }

    pub fn tmax(&self) -> f64 {
        self.tmax
    }

    /// All plotted points, reference first, then samples in insertion order.
    pub fn samples(&self) -> &[SamplePoint] {
        &self.samples
    }

    /// Add a model sample at (arccos(correlation), stddev). The correlation
    /// is clamped to [-1, 1] before conversion so floating-point overshoot
    /// cannot yield a NaN angle; a genuinely out-of-range correlation from
    /// bad statistics still lands outside the visible domain rather than
    /// crashing. Returns the sample's index handle.
    pub fn add_sample(&mut self, std_dev: f64, correlation: f64, style: MarkerStyle) -> usize {
        let angle = correlation_to_angle(correlation);
        self.samples.push(SamplePoint {
            std_dev,
            correlation,
            angle,
            style,
        });
        self.samples.len() - 1
    }

    /// Overlay the polar grid: rays at the correlation tick angles and arcs
    /// at the stddev tick radii. Uses only geometry fixed at construction.
    pub fn add_grid(&mut self) {
        let mut lines: Vec<Vec<[f64; 2]>> = Vec::new();
        for &(_, angle) in &self.corr_ticks {
            lines.push(vec![
                polar_to_cartesian(angle, self.smin),
                polar_to_cartesian(angle, self.smax),
            ]);
        }
        for &radius in &self.std_ticks {
            if radius > self.smin && radius < self.smax {
                lines.push(arc_points(radius, 0.0, self.tmax, ARC_SEGMENTS));
            }
        }
        self.grid = Some(lines);
    }

    /// Compute and attach the iso-RMS contour overlay over the full domain,
    /// returning the contour set for inspection or inline labeling.
    pub fn add_contours(&mut self, levels: &ContourLevels) -> &ContourSet {
        let set = compute_contours(self.ref_std, self.smin, self.smax, self.tmax, levels);
        self.contours.insert(set)
    }

    pub fn contours(&self) -> Option<&ContourSet> {
        self.contours.as_ref()
    }

    /// Assemble the renderable figure: axes, reference arc, optional grid
    /// and contours, sample markers, and legend entries (styles whose label
    /// starts with '_' stay off the legend).
    pub fn to_figure(&self, palette: &FigurePalette) -> DiagramFigure {
        let mut fig = DiagramFigure::default();
        let axis_stroke = LineStroke::solid(1.2, palette.axis);

        // Grid and contours go in first so axes and markers paint on top.
        if let Some(grid) = &self.grid {
            for line in grid {
                fig.push_line(line.clone(), LineStroke::dashed(0.6, palette.grid));
            }
        }
        if let Some(contours) = &self.contours {
            for contour in &contours.lines {
                for path in &contour.paths {
                    fig.push_line(path.clone(), LineStroke::solid(1.0, palette.contour));
                }
                if let Some(anchor) = contour.label_anchor {
                    fig.push_text(
                        anchor,
                        format!("{:.2}", contour.level),
                        10.0,
                        palette.contour,
                        TextAnchor::Center,
                    );
                }
            }
        }

        self.push_axes(&mut fig, palette, axis_stroke);

        // Dashed arc at the reference standard deviation.
        fig.push_line(
            arc_points(self.ref_std, 0.0, self.tmax, ARC_SEGMENTS),
            LineStroke::dashed(1.0, palette.axis),
        );

        // Sample markers, reference first.
        for sample in &self.samples {
            fig.push_marker(
                polar_to_cartesian(sample.angle, sample.std_dev),
                sample.style.clone(),
            );
        }

        fig.legend = self
            .samples
            .iter()
            .filter(|s| !s.style.hidden_from_legend())
            .map(|s| crate::diagram::figure::LegendEntry {
                style: s.style.clone(),
            })
            .collect();

        fig
    }

    fn push_axes(&self, fig: &mut DiagramFigure, palette: &FigurePalette, axis_stroke: LineStroke) {
        let extended = self.tmax > std::f64::consts::FRAC_PI_2 + 1e-9;

        // Outer boundary: the correlation arc.
        fig.push_line(arc_points(self.smax, 0.0, self.tmax, ARC_SEGMENTS), axis_stroke);

        // Correlation tick marks and labels along the outer arc.
        for &(corr, angle) in &self.corr_ticks {
            fig.push_line(
                vec![
                    polar_to_cartesian(angle, self.smax),
                    polar_to_cartesian(angle, self.smax * 0.985),
                ],
                axis_stroke,
            );
            fig.push_text(
                polar_to_cartesian(angle, self.smax * 1.04),
                axes::format_correlation(corr),
                10.0,
                palette.tick_label,
                TextAnchor::Center,
            );
        }
        fig.push_text(
            polar_to_cartesian(self.tmax / 2.0, self.smax * 1.13),
            "Correlation coefficient",
            12.0,
            palette.axis,
            TextAnchor::Center,
        );

        // The angle-0 edge: primary standard-deviation axis with ticks.
        fig.push_line(vec![[self.smin, 0.0], [self.smax, 0.0]], axis_stroke);
        for &tick in &self.std_ticks {
            fig.push_line(
                vec![[tick, 0.0], [tick, -self.smax * 0.015]],
                axis_stroke,
            );
            fig.push_text(
                [tick, -self.smax * 0.035],
                axes::format_tick_value(tick),
                10.0,
                palette.tick_label,
                TextAnchor::Below,
            );
        }
        fig.push_text(
            [(self.smin + self.smax) / 2.0, -self.smax * 0.1],
            "Standard deviation",
            12.0,
            palette.axis,
            TextAnchor::Below,
        );

        // The far edge at tmax: twin standard-deviation axis. Vertical for
        // the quarter-circle diagram, along the negative x-axis when
        // extended; tick labels sit outside the plot region either way.
        fig.push_line(
            vec![
                polar_to_cartesian(self.tmax, self.smin),
                polar_to_cartesian(self.tmax, self.smax),
            ],
            axis_stroke,
        );
        for &tick in &self.std_ticks {
            let outward = if extended {
                [0.0, -self.smax * 0.015]
            } else {
                [-self.smax * 0.015, 0.0]
            };
            let base = polar_to_cartesian(self.tmax, tick);
            fig.push_line(
                vec![base, [base[0] + outward[0], base[1] + outward[1]]],
                axis_stroke,
            );
            let label_pos = [base[0] + outward[0] * 2.3, base[1] + outward[1] * 2.3];
            let anchor = if extended {
                TextAnchor::Below
            } else {
                TextAnchor::LeftOf
            };
            fig.push_text(
                label_pos,
                axes::format_tick_value(tick),
                10.0,
                palette.tick_label,
                anchor,
            );
        }
        {
            let mid = polar_to_cartesian(self.tmax, (self.smin + self.smax) / 2.0);
            let (pos, anchor) = if extended {
                ([mid[0], mid[1] - self.smax * 0.1], TextAnchor::Below)
            } else {
                ([mid[0] - self.smax * 0.1, mid[1]], TextAnchor::LeftOf)
            };
            fig.push_text(pos, "Standard deviation", 12.0, palette.axis, anchor);
        }

        // Inner boundary at smin: only drawn when the radial axis does not
        // start at zero, and never with tick labels.
        if self.smin > 0.0 {
            fig.push_line(arc_points(self.smin, 0.0, self.tmax, ARC_SEGMENTS), axis_stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::style::{color_for_index, MarkerStyle};
    use std::f64::consts::PI;

    fn palette() -> FigurePalette {
        FigurePalette {
            axis: [0, 0, 0, 255],
            tick_label: [80, 80, 80, 255],
            grid: [160, 160, 160, 120],
            contour: [128, 128, 128, 255],
        }
    }

    fn diagram() -> TaylorDiagram {
        TaylorDiagram::new(
            174.0605,
            (0.0, 1.8),
            false,
            MarkerStyle::reference("Average", [0, 0, 0, 255]),
        )
        .unwrap()
    }

    #[test]
    fn axis_bounds_scale_with_reference() {
        let dia = diagram();
        assert_eq!(dia.smin(), 0.0);
        assert!((dia.smax() - 1.8 * 174.0605).abs() < 1e-9);
        assert!((dia.tmax() - PI / 2.0).abs() < 1e-12);

        let extended = TaylorDiagram::new(
            2.0,
            (0.5, 1.5),
            true,
            MarkerStyle::reference("ref", [0, 0, 0, 255]),
        )
        .unwrap();
        assert_eq!(extended.smin(), 1.0);
        assert_eq!(extended.smax(), 3.0);
        assert!((extended.tmax() - PI).abs() < 1e-12);
    }

    #[test]
    fn invalid_construction_is_rejected() {
        let style = || MarkerStyle::reference("ref", [0, 0, 0, 255]);
        assert!(TaylorDiagram::new(f64::NAN, (0.0, 1.8), false, style()).is_err());
        assert!(TaylorDiagram::new(0.0, (0.0, 1.8), false, style()).is_err());
        assert!(TaylorDiagram::new(-1.0, (0.0, 1.8), false, style()).is_err());
        assert!(TaylorDiagram::new(1.0, (1.8, 0.0), false, style()).is_err());
        assert!(TaylorDiagram::new(1.0, (0.0, f64::INFINITY), false, style()).is_err());
    }

    #[test]
    fn reference_point_renders_at_angle_zero() {
        let dia = diagram();
        let reference = &dia.samples()[0];
        assert_eq!(reference.angle, 0.0);
        assert_eq!(reference.std_dev, 174.0605);

        let fig = dia.to_figure(&palette());
        let marker = &fig.markers[0];
        assert!((marker.pos[0] - 174.0605).abs() < 1e-9);
        assert!(marker.pos[1].abs() < 1e-9);
    }

    #[test]
    fn sample_angles_stay_in_quadrant_for_positive_correlations() {
        let mut dia = diagram();
        for (i, corr) in [0.0, 0.3, 0.77, 0.95, 1.0].iter().enumerate() {
            let idx = dia.add_sample(
                100.0,
                *corr,
                MarkerStyle::sample(format!("m{i}"), color_for_index(i)),
            );
            let angle = dia.samples()[idx].angle;
            assert!((0.0..=PI / 2.0).contains(&angle), "corr {corr} -> {angle}");
        }
    }

    #[test]
    fn negative_correlation_lands_outside_quadrant() {
        let mut dia = diagram();
        let idx = dia.add_sample(100.0, -0.4, MarkerStyle::sample("m", color_for_index(0)));
        let angle = dia.samples()[idx].angle;
        assert!(angle > PI / 2.0 && angle <= PI);
    }

    #[test]
    fn identical_candidate_coincides_with_reference() {
        let mut dia = diagram();
        let idx = dia.add_sample(174.0605, 1.0, MarkerStyle::sample("twin", color_for_index(0)));
        let sample = &dia.samples()[idx];
        assert_eq!(sample.angle, 0.0);

        let fig = dia.to_figure(&palette());
        let reference = fig.markers[0].pos;
        let twin = fig.markers[idx].pos;
        assert!((reference[0] - twin[0]).abs() < 1e-12);
        assert!((reference[1] - twin[1]).abs() < 1e-12);
    }

    #[test]
    fn legend_keeps_reference_plus_samples_in_order() {
        let mut dia = diagram();
        let labels = [
            "BCC-CSM2-MR",
            "CanESM5",
            "NorESM2-LM",
            "CESM2",
            "MPI-ESM1-2-LR",
            "EC-Earth3-CC",
            "ACCESS-ESM1-5",
            "GISS-E2-1-G-CC",
        ];
        for (i, label) in labels.iter().enumerate() {
            dia.add_sample(
                120.0 + i as f64,
                0.9,
                MarkerStyle::sample(*label, color_for_index(i)),
            );
        }

        let fig = dia.to_figure(&palette());
        assert_eq!(fig.legend.len(), labels.len() + 1);
        assert_eq!(fig.legend[0].style.label, "Average");
        for (i, label) in labels.iter().enumerate() {
            assert_eq!(fig.legend[i + 1].style.label, *label);
        }
    }

    #[test]
    fn hidden_labels_stay_off_the_legend() {
        let mut dia = diagram();
        dia.add_sample(100.0, 0.5, MarkerStyle::sample("_helper", color_for_index(0)));
        dia.add_sample(110.0, 0.6, MarkerStyle::sample("visible", color_for_index(1)));
        let fig = dia.to_figure(&palette());
        assert_eq!(fig.legend.len(), 2);
        assert_eq!(fig.legend[1].style.label, "visible");
    }

    #[test]
    fn grid_covers_ticks_within_bounds() {
        let mut dia = diagram();
        dia.add_grid();
        let grid = dia.grid.as_ref().unwrap();
        // One ray per correlation tick plus one arc per interior std tick.
        let rays = dia.corr_ticks.len();
        assert!(grid.len() >= rays);
        for line in grid {
            for p in line {
                let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
                assert!(r <= dia.smax() * (1.0 + 1e-9));
            }
        }
    }

    #[test]
    fn contours_attach_and_report_levels() {
        let mut dia = diagram();
        let set = dia.add_contours(&ContourLevels::Count(5));
        assert_eq!(set.lines.len(), 5);
        assert!(dia.contours().is_some());
    }

    #[test]
    fn inner_boundary_only_when_axis_starts_above_zero() {
        // An inner boundary is a long polyline whose every vertex sits at
        // radius smin.
        let has_inner_arc = |fig: &DiagramFigure, smin: f64| {
            fig.lines.iter().any(|line| {
                line.points.len() > ARC_SEGMENTS / 2
                    && line.points.iter().all(|p| {
                        ((p[0] * p[0] + p[1] * p[1]).sqrt() - smin).abs() < 1e-6
                    })
            })
        };

        let with_zero = diagram();
        let fig_zero = with_zero.to_figure(&palette());
        assert!(!has_inner_arc(&fig_zero, 0.0));

        let raised = TaylorDiagram::new(
            174.0605,
            (0.5, 1.8),
            false,
            MarkerStyle::reference("Average", [0, 0, 0, 255]),
        )
        .unwrap();
        let fig_raised = raised.to_figure(&palette());
        assert!(has_inner_arc(&fig_raised, raised.smin()));
    }

    #[test]
    fn non_finite_sample_propagates_into_figure_geometry() {
        let mut dia = diagram();
        let idx = dia.add_sample(f64::NAN, 0.9, MarkerStyle::sample("bad", color_for_index(0)));
        let fig = dia.to_figure(&palette());
        assert!(fig.markers[idx].pos[0].is_nan());
    }
}
