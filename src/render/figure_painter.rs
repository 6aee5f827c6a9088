use egui::{Align2, Color32, FontId, Pos2, Stroke};

use crate::diagram::figure::{DiagramFigure, FigureLine, FigureText, TextAnchor};
use crate::diagram::style::{MarkerShape, MarkerStyle};

/// Maps diagram data coordinates into a screen rect, preserving aspect
/// ratio so circles stay circular.
#[derive(Debug, Clone, Copy)]
pub struct FitTransform {
    scale: f64,
    /// Data-space center mapped to the rect center.
    center: [f64; 2],
    rect_center: Pos2,
}

impl FitTransform {
    /// Fit the data bounds into `rect` with a margin fraction on each side.
    pub fn fit(min: [f64; 2], max: [f64; 2], rect: egui::Rect, margin: f64) -> Self {
        let dx = (max[0] - min[0]).max(f64::EPSILON);
        let dy = (max[1] - min[1]).max(f64::EPSILON);
        let pad_x = dx * margin;
        let pad_y = dy * margin;
        let span_x = dx + 2.0 * pad_x;
        let span_y = dy + 2.0 * pad_y;

        let scale = (rect.width() as f64 / span_x).min(rect.height() as f64 / span_y);

        Self {
            scale,
            center: [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0],
            rect_center: rect.center(),
        }
    }

    pub fn to_screen(&self, p: [f64; 2]) -> Pos2 {
        Pos2::new(
            self.rect_center.x + ((p[0] - self.center[0]) * self.scale) as f32,
            // Screen y grows downward.
            self.rect_center.y - ((p[1] - self.center[1]) * self.scale) as f32,
        )
    }
}

fn rgba(c: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

/// Paint a diagram figure into `rect`: background, primitives in order,
/// then the legend box in the top-right corner.
pub fn paint_figure(
    painter: &egui::Painter,
    rect: egui::Rect,
    figure: &DiagramFigure,
    bg: Color32,
    legend_bg: Color32,
) {
    painter.rect_filled(rect, 0.0, bg);

    let (min, max) = match figure.bounds() {
        Some(bounds) => bounds,
        None => return,
    };
    let transform = FitTransform::fit(min, max, rect, 0.05);

    for line in &figure.lines {
        paint_line(painter, &transform, line);
    }
    for marker in &figure.markers {
        paint_marker(painter, transform.to_screen(marker.pos), &marker.style);
    }
    for text in &figure.texts {
        paint_text(painter, &transform, text);
    }

    paint_legend(painter, rect, figure, legend_bg);
}

fn paint_line(painter: &egui::Painter, transform: &FitTransform, line: &FigureLine) {
    let points: Vec<Pos2> = line
        .points
        .iter()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .map(|p| transform.to_screen(*p))
        .collect();
    if points.len() < 2 {
        return;
    }

    let stroke = Stroke::new(line.stroke.width, rgba(line.stroke.color));
    if line.stroke.dashed {
        for shape in egui::Shape::dashed_line(&points, stroke, 6.0, 4.0) {
            painter.add(shape);
        }
    } else {
        painter.add(egui::Shape::line(points, stroke));
    }
}

fn paint_marker(painter: &egui::Painter, center: Pos2, style: &MarkerStyle) {
    if !center.x.is_finite() || !center.y.is_finite() {
        return;
    }
    let r = style.size;
    let fill = rgba(style.face_color);
    let edge = Stroke::new(1.0, rgba(style.edge_color));

    match style.marker {
        MarkerShape::Circle => {
            painter.circle(center, r, fill, edge);
        }
        MarkerShape::Square => {
            let rect = egui::Rect::from_center_size(center, egui::vec2(r * 1.8, r * 1.8));
            painter.rect_filled(rect, 0.0, fill);
            painter.rect_stroke(rect, 0.0, edge, egui::StrokeKind::Outside);
        }
        MarkerShape::Diamond => {
            let pts = vec![
                Pos2::new(center.x, center.y - r),
                Pos2::new(center.x + r, center.y),
                Pos2::new(center.x, center.y + r),
                Pos2::new(center.x - r, center.y),
            ];
            painter.add(egui::Shape::convex_polygon(pts, fill, edge));
        }
        MarkerShape::TriangleUp => {
            let pts = vec![
                Pos2::new(center.x, center.y - r),
                Pos2::new(center.x + r, center.y + r * 0.8),
                Pos2::new(center.x - r, center.y + r * 0.8),
            ];
            painter.add(egui::Shape::convex_polygon(pts, fill, edge));
        }
        MarkerShape::Cross => {
            let w = Stroke::new((r * 0.4).max(1.5), rgba(style.edge_color));
            painter.line_segment(
                [
                    Pos2::new(center.x - r, center.y - r),
                    Pos2::new(center.x + r, center.y + r),
                ],
                w,
            );
            painter.line_segment(
                [
                    Pos2::new(center.x - r, center.y + r),
                    Pos2::new(center.x + r, center.y - r),
                ],
                w,
            );
        }
        MarkerShape::Star => paint_star(painter, center, r * 1.4, fill, edge),
    }
}

/// A five-point star as one convex pentagon core plus five spike triangles.
fn paint_star(painter: &egui::Painter, center: Pos2, outer: f32, fill: Color32, edge: Stroke) {
    use std::f32::consts::PI;
    let inner = outer * 0.45;
    let vertex = |radius: f32, angle: f32| {
        Pos2::new(
            center.x + radius * angle.cos(),
            center.y - radius * angle.sin(),
        )
    };

    let mut outer_pts = [Pos2::ZERO; 5];
    let mut inner_pts = [Pos2::ZERO; 5];
    for k in 0..5 {
        let angle = PI / 2.0 + k as f32 * 2.0 * PI / 5.0;
        outer_pts[k] = vertex(outer, angle);
        inner_pts[k] = vertex(inner, angle + PI / 5.0);
    }

    painter.add(egui::Shape::convex_polygon(
        inner_pts.to_vec(),
        fill,
        Stroke::NONE,
    ));
    for k in 0..5 {
        let prev = inner_pts[(k + 4) % 5];
        painter.add(egui::Shape::convex_polygon(
            vec![outer_pts[k], inner_pts[k], prev],
            fill,
            Stroke::NONE,
        ));
    }

    let mut outline = Vec::with_capacity(10);
    for k in 0..5 {
        outline.push(outer_pts[k]);
        outline.push(inner_pts[k]);
    }
    painter.add(egui::Shape::closed_line(outline, edge));
}

fn paint_text(painter: &egui::Painter, transform: &FitTransform, text: &FigureText) {
    if !text.pos[0].is_finite() || !text.pos[1].is_finite() {
        return;
    }
    let align = match text.anchor {
        TextAnchor::Center => Align2::CENTER_CENTER,
        TextAnchor::LeftOf => Align2::RIGHT_CENTER,
        TextAnchor::RightOf => Align2::LEFT_CENTER,
        TextAnchor::Above => Align2::CENTER_BOTTOM,
        TextAnchor::Below => Align2::CENTER_TOP,
    };
    painter.text(
        transform.to_screen(text.pos),
        align,
        &text.text,
        FontId::proportional(text.size),
        rgba(text.color),
    );
}

fn paint_legend(painter: &egui::Painter, rect: egui::Rect, figure: &DiagramFigure, bg: Color32) {
    if figure.legend.is_empty() {
        return;
    }

    let row_height = 18.0;
    let font = FontId::proportional(11.0);
    let max_chars = figure
        .legend
        .iter()
        .map(|e| e.style.label.chars().count())
        .max()
        .unwrap_or(0);
    let width = 34.0 + max_chars as f32 * 6.5;
    let height = 8.0 + row_height * figure.legend.len() as f32;

    let legend_rect = egui::Rect::from_min_size(
        Pos2::new(rect.right() - width - 8.0, rect.top() + 8.0),
        egui::vec2(width, height),
    );

    painter.rect_filled(legend_rect, 4.0, bg);
    painter.rect_stroke(
        legend_rect,
        4.0,
        Stroke::new(1.0, Color32::from_gray(128)),
        egui::StrokeKind::Outside,
    );

    let text_color = painter.ctx().style().visuals.text_color();
    for (i, entry) in figure.legend.iter().enumerate() {
        let y = legend_rect.top() + 4.0 + row_height * (i as f32 + 0.5);
        let swatch_center = Pos2::new(legend_rect.left() + 14.0, y);
        let mut swatch = entry.style.clone();
        swatch.size = swatch.size.min(6.0);
        paint_marker(painter, swatch_center, &swatch);
        painter.text(
            Pos2::new(legend_rect.left() + 26.0, y),
            Align2::LEFT_CENTER,
            &entry.style.label,
            font.clone(),
            text_color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_preserves_aspect_ratio() {
        let rect = egui::Rect::from_min_size(Pos2::new(0.0, 0.0), egui::vec2(200.0, 100.0));
        let t = FitTransform::fit([0.0, 0.0], [10.0, 10.0], rect, 0.0);
        let origin = t.to_screen([0.0, 0.0]);
        let right = t.to_screen([10.0, 0.0]);
        let top = t.to_screen([0.0, 10.0]);
        let w = right.x - origin.x;
        let h = origin.y - top.y;
        assert!((w - h).abs() < 1e-3, "w {w} h {h}");
        // Constrained by the short side.
        assert!((h - 100.0).abs() < 1e-3);
    }

    #[test]
    fn screen_y_is_flipped() {
        let rect = egui::Rect::from_min_size(Pos2::new(0.0, 0.0), egui::vec2(100.0, 100.0));
        let t = FitTransform::fit([0.0, 0.0], [1.0, 1.0], rect, 0.0);
        let low = t.to_screen([0.5, 0.0]);
        let high = t.to_screen([0.5, 1.0]);
        assert!(high.y < low.y);
    }

    #[test]
    fn fit_centers_data_in_rect() {
        let rect = egui::Rect::from_min_size(Pos2::new(50.0, 20.0), egui::vec2(300.0, 200.0));
        let t = FitTransform::fit([-2.0, 1.0], [4.0, 3.0], rect, 0.1);
        let center = t.to_screen([1.0, 2.0]);
        assert!((center.x - rect.center().x).abs() < 1e-3);
        assert!((center.y - rect.center().y).abs() < 1e-3);
    }
}
