use crate::data::loader::LoadedData;
use crate::data::parser;

/// State for the column-selection dialog, created when the user loads a
/// file and needs to choose the reference column and the model columns.
pub struct ColumnDialogState {
    pub loaded_data: LoadedData,
    pub target_diagram_id: u64,
    /// Index into `usable_columns` of the reference series.
    pub selected_reference: usize,
    /// Parallel to `usable_columns`: which columns enter as models.
    pub selected_models: Vec<bool>,
    /// Column indices that hold mostly-numeric, non-time data.
    pub usable_columns: Vec<usize>,
}

impl ColumnDialogState {
    pub fn new(loaded_data: LoadedData, target_diagram_id: u64) -> Self {
        // Candidate columns: mostly numeric, and not the Year/time axis.
        let usable_columns: Vec<usize> = (0..loaded_data.columns.len())
            .filter(|&i| {
                let name = loaded_data.columns[i].to_lowercase();
                if name.contains("year") || name.contains("time") || name.contains("date") {
                    return false;
                }
                parser::numeric_fraction(&loaded_data.column_data[i], 100) >= 0.5
            })
            .collect();

        // Default the reference to an average-like column when present.
        let selected_reference = usable_columns
            .iter()
            .position(|&i| {
                let name = loaded_data.columns[i].to_lowercase();
                name == "avg" || name.contains("avg") || name.contains("mean")
            })
            .unwrap_or(0);

        // Preselect every other column as a model; the CMIP6 table layout
        // is one column per model plus the aggregate.
        let selected_models: Vec<bool> = (0..usable_columns.len())
            .map(|i| i != selected_reference)
            .collect();

        Self {
            loaded_data,
            target_diagram_id,
            selected_reference,
            selected_models,
            usable_columns,
        }
    }
}

/// The columns the user confirmed.
pub struct ColumnSelection {
    pub diagram_id: u64,
    pub reference_index: usize,
    pub model_indices: Vec<usize>,
}

/// Result of the dialog interaction each frame.
pub enum DialogResult {
    Ok(ColumnSelection),
    Cancel,
}

/// Show the column-selection dialog as an egui window.
///
/// Returns `Some(DialogResult)` when the user presses OK or Cancel,
/// or `None` while the dialog is still open.
pub fn show_column_dialog(
    ctx: &egui::Context,
    state: &mut ColumnDialogState,
) -> Option<DialogResult> {
    let mut result = None;

    egui::Window::new("Select Reference and Models")
        .collapsible(false)
        .resizable(true)
        .default_width(440.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "File contains {} columns and {} rows. Year/time columns are excluded.",
                    state.loaded_data.columns.len(),
                    state.loaded_data.row_count,
                ))
                .weak(),
            );

            ui.add_space(12.0);

            if state.usable_columns.is_empty() {
                ui.colored_label(
                    egui::Color32::from_rgb(255, 80, 80),
                    "No numeric columns found in this file.",
                );
            } else {
                ui.label(egui::RichText::new("Reference series").strong());
                ui.add_space(2.0);
                let current_name =
                    &state.loaded_data.columns[state.usable_columns[state.selected_reference]];
                egui::ComboBox::from_id_salt("reference_selector")
                    .selected_text(current_name)
                    .width(280.0)
                    .show_ui(ui, |ui| {
                        for (i, &col_idx) in state.usable_columns.iter().enumerate() {
                            ui.selectable_value(
                                &mut state.selected_reference,
                                i,
                                &state.loaded_data.columns[col_idx],
                            );
                        }
                    });

                ui.add_space(12.0);

                ui.label(egui::RichText::new("Model series (select one or more)").strong());
                ui.add_space(2.0);
                egui::Frame::group(ui.style())
                    .inner_margin(egui::Margin::same(8))
                    .show(ui, |ui| {
                        egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                            for (i, &col_idx) in state.usable_columns.iter().enumerate() {
                                if i == state.selected_reference {
                                    // The reference cannot be its own model.
                                    state.selected_models[i] = false;
                                    continue;
                                }
                                ui.checkbox(
                                    &mut state.selected_models[i],
                                    &state.loaded_data.columns[col_idx],
                                );
                            }
                        });
                    });
            }

            ui.add_space(16.0);

            let any_model = state
                .selected_models
                .iter()
                .enumerate()
                .any(|(i, &sel)| sel && i != state.selected_reference);
            ui.horizontal(|ui| {
                let ok_btn = ui.add_enabled(
                    any_model,
                    egui::Button::new(egui::RichText::new("OK").strong())
                        .min_size(egui::vec2(100.0, 32.0)),
                );
                if ok_btn.clicked() {
                    let reference_index = state.usable_columns[state.selected_reference];
                    let model_indices: Vec<usize> = state
                        .selected_models
                        .iter()
                        .enumerate()
                        .filter(|&(i, &sel)| sel && i != state.selected_reference)
                        .map(|(i, _)| state.usable_columns[i])
                        .collect();
                    result = Some(DialogResult::Ok(ColumnSelection {
                        diagram_id: state.target_diagram_id,
                        reference_index,
                        model_indices,
                    }));
                }

                if ui
                    .add(egui::Button::new("Cancel").min_size(egui::vec2(100.0, 32.0)))
                    .clicked()
                {
                    result = Some(DialogResult::Cancel);
                }

                if !any_model {
                    ui.label(egui::RichText::new("Select at least one model column").weak());
                }
            });
        });

    result
}
