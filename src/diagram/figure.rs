use crate::diagram::style::MarkerStyle;

/// Stroke attributes for a figure polyline.
#[derive(Debug, Clone, Copy)]
pub struct LineStroke {
    pub width: f32,
    pub color: [u8; 4],
    pub dashed: bool,
}

impl LineStroke {
    pub fn solid(width: f32, color: [u8; 4]) -> Self {
        Self { width, color, dashed: false }
    }

    pub fn dashed(width: f32, color: [u8; 4]) -> Self {
        Self { width, color, dashed: true }
    }
}

/// A polyline in diagram data coordinates.
#[derive(Debug, Clone)]
pub struct FigureLine {
    pub points: Vec<[f64; 2]>,
    pub stroke: LineStroke,
}

/// A marker in diagram data coordinates.
#[derive(Debug, Clone)]
pub struct FigureMarker {
    pub pos: [f64; 2],
    pub style: MarkerStyle,
}

/// Placement of a text item relative to its anchor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Center,
    LeftOf,
    RightOf,
    Above,
    Below,
}

/// A text item in diagram data coordinates.
#[derive(Debug, Clone)]
pub struct FigureText {
    pub pos: [f64; 2],
    pub text: String,
    /// Font size in screen points.
    pub size: f32,
    pub color: [u8; 4],
    pub anchor: TextAnchor,
}

/// One legend row: marker swatch plus label.
#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub style: MarkerStyle,
}

/// The renderable figure: an ordered bag of draw primitives in diagram data
/// coordinates plus the legend rows, produced by `TaylorDiagram::to_figure`.
/// The UI layer maps data coordinates to screen space and paints; nothing in
/// here depends on a particular plotting toolkit.
#[derive(Debug, Clone, Default)]
pub struct DiagramFigure {
    pub lines: Vec<FigureLine>,
    pub markers: Vec<FigureMarker>,
    pub texts: Vec<FigureText>,
    pub legend: Vec<LegendEntry>,
}

impl DiagramFigure {
    pub fn push_line(&mut self, points: Vec<[f64; 2]>, stroke: LineStroke) {
        if points.len() >= 2 {
            self.lines.push(FigureLine { points, stroke });
        }
    }

    pub fn push_marker(&mut self, pos: [f64; 2], style: MarkerStyle) {
        self.markers.push(FigureMarker { pos, style });
    }

    pub fn push_text(
        &mut self,
        pos: [f64; 2],
        text: impl Into<String>,
        size: f32,
        color: [u8; 4],
        anchor: TextAnchor,
    ) {
        self.texts.push(FigureText {
            pos,
            text: text.into(),
            size,
            color,
            anchor,
        });
    }

    /// Bounding box of everything placed so far, as (min, max) corners.
    /// Text extents are approximated by their anchor position; the painter
    /// adds outer margin for labels.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        let mut extend = |p: &[f64; 2]| {
            if p[0].is_finite() && p[1].is_finite() {
                min[0] = min[0].min(p[0]);
                min[1] = min[1].min(p[1]);
                max[0] = max[0].max(p[0]);
                max[1] = max[1].max(p[1]);
            }
        };
        for line in &self.lines {
            for p in &line.points {
                extend(p);
            }
        }
        for marker in &self.markers {
            extend(&marker.pos);
        }
        for text in &self.texts {
            extend(&text.pos);
        }
        if min[0].is_finite() && min[1].is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::style::MarkerStyle;

    #[test]
    fn degenerate_lines_are_dropped() {
        let mut fig = DiagramFigure::default();
        fig.push_line(vec![[0.0, 0.0]], LineStroke::solid(1.0, [0, 0, 0, 255]));
        assert!(fig.lines.is_empty());
        fig.push_line(
            vec![[0.0, 0.0], [1.0, 1.0]],
            LineStroke::solid(1.0, [0, 0, 0, 255]),
        );
        assert_eq!(fig.lines.len(), 1);
    }

    #[test]
    fn bounds_cover_all_primitives() {
        let mut fig = DiagramFigure::default();
        assert!(fig.bounds().is_none());

        fig.push_line(
            vec![[0.0, 0.0], [2.0, 1.0]],
            LineStroke::solid(1.0, [0, 0, 0, 255]),
        );
        fig.push_marker([-1.0, 3.0], MarkerStyle::sample("m", [0, 0, 0, 255]));
        let (min, max) = fig.bounds().unwrap();
        assert_eq!(min, [-1.0, 0.0]);
        assert_eq!(max, [2.0, 3.0]);
    }

    #[test]
    fn bounds_ignore_non_finite_points() {
        let mut fig = DiagramFigure::default();
        fig.push_line(
            vec![[0.0, 0.0], [f64::NAN, 1.0], [1.0, 1.0]],
            LineStroke::solid(1.0, [0, 0, 0, 255]),
        );
        let (min, max) = fig.bounds().unwrap();
        assert_eq!(min, [0.0, 0.0]);
        assert_eq!(max, [1.0, 1.0]);
    }
}
