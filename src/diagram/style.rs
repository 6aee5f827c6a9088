use serde::{Deserialize, Serialize};

/// Color palette cycled through for model sample markers
pub const COLOR_PALETTE: [[u8; 4]; 12] = [
    [255, 0, 0, 255],     // Red
    [0, 255, 0, 255],     // Green
    [0, 0, 255, 255],     // Blue
    [255, 255, 0, 255],   // Yellow
    [255, 0, 255, 255],   // Magenta
    [0, 255, 255, 255],   // Cyan
    [255, 165, 0, 255],   // Orange
    [128, 0, 128, 255],   // Purple
    [0, 128, 0, 255],     // Dark Green
    [0, 0, 128, 255],     // Navy
    [255, 192, 203, 255], // Pink
    [165, 42, 42, 255],   // Brown
];

pub fn color_for_index(index: usize) -> [u8; 4] {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerShape {
    Circle,
    Star,
    Square,
    Diamond,
    TriangleUp,
    Cross,
}

impl Default for MarkerShape {
    fn default() -> Self {
        MarkerShape::Circle
    }
}

/// Marker appearance for one plotted point. This is the complete set of
/// supported styling fields; there is no open-ended option bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub marker: MarkerShape,
    /// Marker radius in screen points.
    pub size: f32,
    pub face_color: [u8; 4],
    pub edge_color: [u8; 4],
    /// Legend label. Labels starting with '_' are hidden from the legend.
    pub label: String,
}

impl MarkerStyle {
    /// Style for the distinguished reference marker.
    pub fn reference(label: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            marker: MarkerShape::Star,
            size: 8.0,
            face_color: color,
            edge_color: color,
            label: label.into(),
        }
    }

    /// Default style for a model sample: filled dot in a palette color.
    pub fn sample(label: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            marker: MarkerShape::Circle,
            size: 5.0,
            face_color: color,
            edge_color: color,
            label: label.into(),
        }
    }

    pub fn hidden_from_legend(&self) -> bool {
        self.label.is_empty() || self.label.starts_with('_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps_around() {
        assert_eq!(color_for_index(0), color_for_index(COLOR_PALETTE.len()));
        assert_eq!(color_for_index(3), COLOR_PALETTE[3]);
    }

    #[test]
    fn underscore_labels_are_hidden() {
        let style = MarkerStyle::sample("_", [0, 0, 0, 255]);
        assert!(style.hidden_from_legend());
        let style = MarkerStyle::sample("CanESM5", [0, 0, 0, 255]);
        assert!(!style.hidden_from_legend());
    }
}
