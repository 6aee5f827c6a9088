use crate::state::diagram_state::DiagramState;

/// Persistent state for the settings dialog, created when the user opens
/// settings for a particular diagram.
pub struct SettingsDialogState {
    pub diagram_id: u64,
}

impl SettingsDialogState {
    pub fn new(diagram_id: u64) -> Self {
        Self { diagram_id }
    }
}

/// Show the settings dialog window, editing the diagram configuration in
/// place. Returns `true` while it should stay open, `false` when the user
/// closes it.
pub fn show_settings_dialog(
    ctx: &egui::Context,
    _state: &SettingsDialogState,
    diagram: &mut DiagramState,
) -> bool {
    let mut open = true;

    egui::Window::new("Diagram Settings")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(360.0)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Standard deviation axis").strong());
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Range (in units of reference stddev):");
                ui.add(
                    egui::DragValue::new(&mut diagram.config.std_range.0)
                        .speed(0.05)
                        .range(0.0..=10.0),
                );
                ui.label("to");
                ui.add(
                    egui::DragValue::new(&mut diagram.config.std_range.1)
                        .speed(0.05)
                        .range(0.1..=10.0),
                );
            });
            if diagram.config.std_range.1 <= diagram.config.std_range.0 {
                ui.colored_label(
                    egui::Color32::from_rgb(255, 80, 80),
                    "Maximum must be greater than minimum.",
                );
            }

            ui.add_space(10.0);
            ui.label(egui::RichText::new("Correlation axis").strong());
            ui.add_space(4.0);
            ui.checkbox(
                &mut diagram.config.extend_negative,
                "Extend to negative correlations",
            );

            ui.add_space(10.0);
            ui.label(egui::RichText::new("RMS contours").strong());
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Levels:");
                let mut levels = diagram.config.contour_levels as u32;
                ui.add(egui::DragValue::new(&mut levels).range(1..=20));
                diagram.config.contour_levels = levels as usize;
            });

            ui.add_space(10.0);
            if let Some(ref_std) = diagram.ref_std {
                ui.label(
                    egui::RichText::new(format!(
                        "Reference: {} (stddev {:.4})",
                        diagram.ref_label, ref_std
                    ))
                    .weak(),
                );
            } else {
                ui.label(egui::RichText::new("No reference loaded yet.").weak());
            }
        });

    open
}
