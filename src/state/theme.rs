use egui::{Color32, Visuals};
use serde::{Deserialize, Serialize};

use crate::diagram::taylor::FigurePalette;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            Theme::Dark => Visuals::dark(),
            Theme::Light => Visuals::light(),
        }
    }

    pub fn plot_bg(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(20, 20, 20),
            Theme::Light => Color32::from_rgb(255, 255, 255),
        }
    }

    /// Background of the legend box, slightly offset from the plot area.
    pub fn legend_bg(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgba_unmultiplied(32, 32, 32, 230),
            Theme::Light => Color32::from_rgba_unmultiplied(248, 248, 248, 230),
        }
    }

    /// Color of the reference marker and axis lines.
    pub fn axis_rgba(&self) -> [u8; 4] {
        match self {
            Theme::Dark => [220, 220, 220, 255],
            Theme::Light => [20, 20, 20, 255],
        }
    }

    /// Colors handed to the figure assembly.
    pub fn diagram_palette(&self) -> FigurePalette {
        match self {
            Theme::Dark => FigurePalette {
                axis: [220, 220, 220, 255],
                tick_label: [170, 170, 170, 255],
                grid: [100, 100, 100, 60],
                contour: [140, 140, 140, 255],
            },
            Theme::Light => FigurePalette {
                axis: [20, 20, 20, 255],
                tick_label: [90, 90, 90, 255],
                grid: [180, 180, 180, 80],
                contour: [128, 128, 128, 255],
            },
        }
    }

}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}
