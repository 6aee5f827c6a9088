use serde::{Deserialize, Serialize};

use crate::diagram::contours::ContourLevels;
use crate::diagram::style::{color_for_index, MarkerStyle};
use crate::diagram::taylor::TaylorDiagram;

static NEXT_DIAGRAM_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_diagram_id() -> u64 {
    NEXT_DIAGRAM_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// Diagram construction parameters exposed to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Radial axis bounds in units of the reference stddev.
    pub std_range: (f64, f64),
    /// Extend the angular domain to negative correlations (half circle).
    pub extend_negative: bool,
    /// Number of evenly spaced iso-RMS contour levels.
    pub contour_levels: usize,
    pub show_grid: bool,
    pub show_contours: bool,
    pub show_table: bool,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            std_range: (0.0, 1.8),
            extend_negative: false,
            contour_levels: 5,
            show_grid: true,
            show_contours: true,
            show_table: false,
        }
    }
}

/// One model's computed statistics, as stored in a project file. The raw
/// series is not retained; the diagram can always be rebuilt from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    pub label: String,
    pub std_dev: f64,
    pub correlation: f64,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramState {
    pub id: u64,
    pub title: String,
    /// Legend label of the reference series.
    pub ref_label: String,
    /// Reference standard deviation, recomputed from the loaded reference
    /// column. None until data has been loaded.
    pub ref_std: Option<f64>,
    pub samples: Vec<SampleRecord>,
    pub config: DiagramConfig,
    /// Checkbox state for the "Remove Models" popup.
    #[serde(skip)]
    pub remove_selected: Vec<bool>,
    /// Screen rect of the panel (set each frame for screenshot cropping).
    #[serde(skip)]
    pub last_frame_rect: Option<egui::Rect>,
}

impl DiagramState {
    pub fn new() -> Self {
        Self {
            id: next_diagram_id(),
            title: "Taylor Diagram".to_string(),
            ref_label: "Reference".to_string(),
            ref_std: None,
            samples: Vec::new(),
            config: DiagramConfig::default(),
            remove_selected: Vec::new(),
            last_frame_rect: None,
        }
    }

    /// Install a new reference series. Any previously computed samples are
    /// invalid against a new reference and are dropped.
    pub fn set_reference(&mut self, label: impl Into<String>, ref_std: f64) {
        self.ref_label = label.into();
        self.ref_std = Some(ref_std);
        self.samples.clear();
    }

    /// Append a model's statistics, assigning the next palette color.
    pub fn push_sample(&mut self, label: impl Into<String>, std_dev: f64, correlation: f64) {
        let color = color_for_index(self.samples.len());
        self.samples.push(SampleRecord {
            label: label.into(),
            std_dev,
            correlation,
            color,
        });
    }

    pub fn remove_sample(&mut self, index: usize) {
        if index < self.samples.len() {
            self.samples.remove(index);
        }
    }

    /// Rebuild the Taylor diagram from the stored records.
    /// Returns Ok(None) when no reference has been loaded yet.
    pub fn build_diagram(&self, ref_color: [u8; 4]) -> Result<Option<TaylorDiagram>, String> {
        let ref_std = match self.ref_std {
            Some(v) => v,
            None => return Ok(None),
        };

        let mut diagram = TaylorDiagram::new(
            ref_std,
            self.config.std_range,
            self.config.extend_negative,
            MarkerStyle::reference(self.ref_label.clone(), ref_color),
        )?;

        for record in &self.samples {
            diagram.add_sample(
                record.std_dev,
                record.correlation,
                MarkerStyle::sample(record.label.clone(), record.color),
            );
        }

        if self.config.show_grid {
            diagram.add_grid();
        }
        if self.config.show_contours && self.config.contour_levels > 0 {
            diagram.add_contours(&ContourLevels::Count(self.config.contour_levels));
        }

        Ok(Some(diagram))
    }
}

impl Default for DiagramState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reference_invalidates_samples() {
        let mut state = DiagramState::new();
        state.set_reference("Average", 174.0605);
        state.push_sample("CanESM5", 150.0, 0.9);
        assert_eq!(state.samples.len(), 1);

        state.set_reference("Average v2", 170.0);
        assert!(state.samples.is_empty());
    }

    #[test]
    fn samples_get_distinct_palette_colors() {
        let mut state = DiagramState::new();
        state.set_reference("Average", 174.0605);
        state.push_sample("a", 150.0, 0.9);
        state.push_sample("b", 160.0, 0.8);
        assert_ne!(state.samples[0].color, state.samples[1].color);
    }

    #[test]
    fn build_without_reference_is_none() {
        let state = DiagramState::new();
        assert!(state.build_diagram([0, 0, 0, 255]).unwrap().is_none());
    }

    #[test]
    fn build_reflects_records_and_config() {
        let mut state = DiagramState::new();
        state.set_reference("Average", 174.0605);
        state.push_sample("CanESM5", 150.0, 0.9);
        state.config.show_contours = true;
        state.config.contour_levels = 3;

        let diagram = state.build_diagram([0, 0, 0, 255]).unwrap().unwrap();
        // Reference plus one sample.
        assert_eq!(diagram.samples().len(), 2);
        assert_eq!(diagram.contours().unwrap().lines.len(), 3);
    }

    #[test]
    fn invalid_config_surfaces_as_error() {
        let mut state = DiagramState::new();
        state.set_reference("Average", 174.0605);
        state.config.std_range = (1.8, 0.0);
        assert!(state.build_diagram([0, 0, 0, 255]).is_err());
    }
}
