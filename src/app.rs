use eframe::egui;
use std::sync::{Arc, Mutex};

use crate::data::loader;
use crate::processing::metrics;
use crate::state::app_state::{AppState, VERSION};
use crate::ui::column_dialog::{ColumnDialogState, ColumnSelection, DialogResult};
use crate::ui::diagram_panel::{self, DiagramAction};
use crate::ui::settings_dialog::{self, SettingsDialogState};

/// What to do when a screenshot arrives.
enum PendingScreenshot {
    SaveFile { diagram_id: u64 },
    Clipboard { diagram_id: u64 },
}

/// Pending async file load result.
struct PendingLoad {
    diagram_id: u64,
    result: Arc<Mutex<Option<Result<loader::LoadedData, String>>>>,
}

/// The main TaylorPlot application.
pub struct TaylorPlotApp {
    pub state: AppState,
    /// Active column-selection dialog (shown after a file is loaded).
    pub column_dialog: Option<ColumnDialogState>,
    /// Active settings dialog for a particular diagram.
    pub settings_dialog: Option<SettingsDialogState>,
    /// An error message to display briefly (could be extended to a toast).
    pub error_message: Option<String>,
    /// Whether to show the About window (hidden menu).
    pub show_about: bool,
    /// Async file load in progress.
    pending_load: Option<PendingLoad>,
    /// Pending screenshot action (save file or clipboard).
    pending_screenshot: Option<PendingScreenshot>,
}

impl TaylorPlotApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let state = AppState::new();

        // --- Global UI style improvements ---
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();

        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::proportional(15.0),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::proportional(14.5),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::proportional(22.0),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            egui::FontId::proportional(12.0),
        );

        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.window_margin = egui::Margin::same(12);

        style.visuals.window_corner_radius = egui::CornerRadius::same(8);
        style.visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(6);
        style.visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
        style.visuals.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
        style.visuals.widgets.active.corner_radius = egui::CornerRadius::same(6);

        ctx.set_style(style);
        ctx.set_visuals(state.theme.visuals());

        Self {
            state,
            column_dialog: None,
            settings_dialog: None,
            error_message: None,
            show_about: false,
            pending_load: None,
            pending_screenshot: None,
        }
    }

    /// Open a native file dialog and, on success, parse the file and open
    /// the column-selection dialog targeting the given diagram.
    fn open_file_dialog(&mut self, diagram_id: u64) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Data Files", &["csv", "xls", "xlsx"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.load_file(diagram_id, &path);
        }
    }

    /// Parse a data file asynchronously so the UI stays responsive.
    fn load_file(&mut self, diagram_id: u64, path: &std::path::Path) {
        let path_buf = path.to_path_buf();
        let result: Arc<Mutex<Option<Result<loader::LoadedData, String>>>> =
            Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);

        std::thread::spawn(move || {
            let loaded = loader::load_file(&path_buf);
            *result_clone.lock().unwrap() = Some(loaded);
        });

        self.pending_load = Some(PendingLoad { diagram_id, result });
    }

    /// Save the current project state to a JSON file.
    fn save_project(&self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("project.taylorplot")
            .add_filter("TaylorPlot Project", &["taylorplot", "json"])
            .save_file()
        {
            match serde_json::to_string_pretty(&self.state) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        tracing::error!("Failed to save project: {e}");
                    } else {
                        tracing::info!("Project saved to {:?}", path);
                    }
                }
                Err(e) => tracing::error!("Failed to serialize project: {e}"),
            }
        }
    }

    /// Load a project from a JSON file.
    fn load_project(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("TaylorPlot Project", &["taylorplot", "json"])
            .pick_file()
        {
            match std::fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<AppState>(&json) {
                    Ok(loaded_state) => {
                        self.state = loaded_state;
                        tracing::info!("Project loaded from {:?}", path);
                    }
                    Err(e) => {
                        self.error_message = Some(format!("Failed to parse project: {e}"));
                    }
                },
                Err(e) => {
                    self.error_message = Some(format!("Failed to read file: {e}"));
                }
            }
        }
    }

    /// Called when the user presses OK in the column-selection dialog.
    /// Computes the reference stddev and each model's (stddev, correlation)
    /// pair, then installs them on the target diagram.
    fn process_column_selection(&mut self, selection: ColumnSelection) {
        let loaded = match self.column_dialog.as_ref() {
            Some(dialog) => &dialog.loaded_data,
            None => return,
        };

        let ref_label = loaded.columns[selection.reference_index].clone();
        let (ref_values, ref_frac) = loader::column_to_f64(&loaded.column_data[selection.reference_index]);

        // Model columns, parsed before the dialog state is dropped.
        let models: Vec<(String, Vec<f64>)> = selection
            .model_indices
            .iter()
            .map(|&idx| {
                let (values, _) = loader::column_to_f64(&loaded.column_data[idx]);
                (loaded.columns[idx].clone(), values)
            })
            .collect();

        self.column_dialog = None;

        if ref_frac < 0.5 {
            self.error_message = Some(format!(
                "Reference column '{ref_label}' is mostly non-numeric"
            ));
            return;
        }

        // The reference stddev is always recomputed from the loaded column.
        let finite_ref: Vec<f64> = ref_values.iter().copied().filter(|v| v.is_finite()).collect();
        let ref_std = metrics::sample_std_dev(&finite_ref);
        if !ref_std.is_finite() || ref_std <= 0.0 {
            self.error_message = Some(format!(
                "Reference column '{ref_label}' has no spread (stddev {ref_std}); cannot scale the diagram"
            ));
            return;
        }

        let diagram = match self.state.diagram_by_id_mut(selection.diagram_id) {
            Some(d) => d,
            None => return,
        };

        diagram.set_reference(ref_label.clone(), ref_std);
        diagram.title = format!("Taylor Diagram vs. {ref_label}");

        let mut skipped: Vec<String> = Vec::new();
        for (label, values) in models {
            // Pair rows and drop those where either side is non-finite.
            let mut reference = Vec::with_capacity(values.len());
            let mut candidate = Vec::with_capacity(values.len());
            for (r, c) in ref_values.iter().zip(values.iter()) {
                if r.is_finite() && c.is_finite() {
                    reference.push(*r);
                    candidate.push(*c);
                }
            }

            if candidate.len() < 2 {
                skipped.push(label);
                continue;
            }

            match metrics::compare_to_reference(&reference, &candidate) {
                Ok(stats) => {
                    tracing::info!(
                        "Model {label}: stddev {:.4}, correlation {:.4}",
                        stats.std_dev,
                        stats.correlation
                    );
                    diagram.push_sample(label, stats.std_dev, stats.correlation);
                }
                Err(e) => {
                    tracing::error!("Model {label}: {e}");
                    skipped.push(label);
                }
            }
        }

        if !skipped.is_empty() {
            self.error_message = Some(format!(
                "Skipped {} model column(s) with too little numeric data: {}",
                skipped.len(),
                skipped.join(", ")
            ));
        }
    }

    /// Handle a screenshot event: crop to the diagram panel and either save
    /// a PNG or copy to the clipboard.
    fn handle_screenshot(&mut self, ctx: &egui::Context, color_image: Arc<egui::ColorImage>) {
        let action = match self.pending_screenshot.take() {
            Some(a) => a,
            None => return,
        };
        let diagram_id = match &action {
            PendingScreenshot::SaveFile { diagram_id } => *diagram_id,
            PendingScreenshot::Clipboard { diagram_id } => *diagram_id,
        };

        let ppp = ctx.pixels_per_point();
        let full_w = color_image.width();
        let crop_rect = self
            .state
            .diagram_by_id(diagram_id)
            .and_then(|d| d.last_frame_rect);

        let (rgba, width, height) = if let Some(rect) = crop_rect {
            let x0 = ((rect.left() * ppp) as usize).min(full_w);
            let y0 = ((rect.top() * ppp) as usize).min(color_image.height());
            let x1 = ((rect.right() * ppp).ceil() as usize).min(full_w);
            let y1 = ((rect.bottom() * ppp).ceil() as usize).min(color_image.height());
            let cw = x1.saturating_sub(x0);
            let ch = y1.saturating_sub(y0);
            let mut cropped = Vec::with_capacity(cw * ch * 4);
            for row in y0..y1 {
                for col in x0..x1 {
                    let c = color_image.pixels[row * full_w + col];
                    cropped.extend_from_slice(&[c.r(), c.g(), c.b(), c.a()]);
                }
            }
            (cropped, cw, ch)
        } else {
            let w = color_image.width();
            let h = color_image.height();
            let rgba: Vec<u8> = color_image
                .pixels
                .iter()
                .flat_map(|c| [c.r(), c.g(), c.b(), c.a()])
                .collect();
            (rgba, w, h)
        };

        match action {
            PendingScreenshot::SaveFile { .. } => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_file_name("taylor_diagram.png")
                    .add_filter("PNG Image", &["png"])
                    .save_file()
                {
                    if let Some(img) =
                        image::RgbaImage::from_raw(width as u32, height as u32, rgba)
                    {
                        if let Err(e) = img.save(&path) {
                            self.error_message = Some(format!("Failed to save image: {e}"));
                        } else {
                            tracing::info!("Saved diagram to {:?}", path);
                        }
                    }
                }
            }
            PendingScreenshot::Clipboard { .. } => match arboard::Clipboard::new() {
                Ok(mut clipboard) => {
                    let img_data = arboard::ImageData {
                        width,
                        height,
                        bytes: std::borrow::Cow::Owned(rgba),
                    };
                    if let Err(e) = clipboard.set_image(img_data) {
                        self.error_message = Some(format!("Failed to copy to clipboard: {e}"));
                    } else {
                        tracing::info!("Copied diagram to clipboard");
                    }
                }
                Err(e) => {
                    self.error_message = Some(format!("Failed to access clipboard: {e}"));
                }
            },
        }
    }
}

impl eframe::App for TaylorPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme visuals every frame (cheap) while preserving rounding.
        let mut vis = self.state.theme.visuals();
        vis.window_corner_radius = egui::CornerRadius::same(8);
        vis.widgets.noninteractive.corner_radius = egui::CornerRadius::same(6);
        vis.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
        vis.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
        vis.widgets.active.corner_radius = egui::CornerRadius::same(6);
        ctx.set_visuals(vis);

        // ------------------------------------------------------------------
        // 0. Handle screenshot events from previous frame
        // ------------------------------------------------------------------
        if self.pending_screenshot.is_some() {
            let mut screenshot_image: Option<Arc<egui::ColorImage>> = None;
            ctx.input(|i| {
                for event in &i.raw.events {
                    if let egui::Event::Screenshot { image, .. } = event {
                        screenshot_image = Some(image.clone());
                    }
                }
            });
            if let Some(color_image) = screenshot_image {
                self.handle_screenshot(ctx, color_image);
            }
        }

        // ------------------------------------------------------------------
        // 1. Handle dropped files
        // ------------------------------------------------------------------
        let mut dropped_paths: Vec<std::path::PathBuf> = Vec::new();
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    let ext = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(|e| e.to_lowercase())
                        .unwrap_or_default();
                    if ext == "csv" || ext == "xls" || ext == "xlsx" {
                        dropped_paths.push(path.clone());
                    }
                }
            }
        });

        for path in dropped_paths {
            // Drop onto the first diagram, or create one if there are none.
            let diagram_id = self
                .state
                .diagrams
                .first()
                .map(|d| d.id)
                .unwrap_or_else(|| self.state.add_diagram().id);
            self.load_file(diagram_id, &path);
        }

        // ------------------------------------------------------------------
        // 2. Header, footer, and the diagram panels
        // ------------------------------------------------------------------
        let mut actions: Vec<(u64, DiagramAction)> = Vec::new();
        let mut save_project = false;
        let mut load_project = false;

        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .inner_margin(egui::Margin::symmetric(16, 8)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.visuals_mut().override_text_color = Some(ui.visuals().strong_text_color());
                    let heading_response = ui.heading("TaylorPlot");
                    ui.visuals_mut().override_text_color = None;
                    heading_response.context_menu(|ui| {
                        if ui.button("About TaylorPlot").clicked() {
                            self.show_about = true;
                            ui.close_menu();
                        }
                        ui.separator();
                        if ui.button("Reset All Diagrams").clicked() {
                            self.state.diagrams.clear();
                            self.state.add_diagram();
                            ui.close_menu();
                        }
                    });

                    ui.separator();

                    if ui.button("Save Project").clicked() {
                        save_project = true;
                    }
                    if ui.button("Load Project").clicked() {
                        load_project = true;
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let theme_label = match self.state.theme {
                            crate::state::theme::Theme::Dark => "Light Mode",
                            crate::state::theme::Theme::Light => "Dark Mode",
                        };
                        if ui.button(theme_label).clicked() {
                            self.state.theme = self.state.theme.toggle();
                        }

                        ui.separator();
                        ui.small(format!("v{VERSION}"));
                    });
                });
            });

        if save_project {
            self.save_project();
        }
        if load_project {
            self.load_project();
        }

        egui::TopBottomPanel::bottom("footer")
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .inner_margin(egui::Margin::symmetric(16, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let add_btn = egui::Button::new(egui::RichText::new("+ New Diagram").strong())
                        .min_size(egui::vec2(130.0, 28.0));
                    if ui.add(add_btn).clicked() {
                        self.state.add_diagram();
                    }

                    ui.separator();

                    let count = self.state.diagrams.len();
                    let label = if count == 1 {
                        "1 diagram".to_string()
                    } else {
                        format!("{count} diagrams")
                    };
                    ui.label(egui::RichText::new(label).weak());

                    if let Some(msg) = &self.error_message {
                        ui.separator();
                        ui.colored_label(egui::Color32::from_rgb(255, 80, 80), msg);
                        if ui.small_button("dismiss").clicked() {
                            self.error_message = None;
                        }
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let viewport_height = ui.available_height();
            let diagram_count = self.state.diagrams.len();
            let spacing = 10.0_f32;
            let panel_height = if diagram_count <= 1 {
                viewport_height
            } else {
                ((viewport_height - spacing) / 2.0).max(360.0)
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                let diagram_ids: Vec<u64> = self.state.diagrams.iter().map(|d| d.id).collect();

                if diagram_ids.is_empty() {
                    ui.add_space(80.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Welcome to TaylorPlot");
                        ui.add_space(12.0);
                        ui.label(
                            egui::RichText::new(
                                "Click \"+ New Diagram\" below, or drag-and-drop a CSV / Excel model table to get started.",
                            )
                            .weak(),
                        );
                    });
                }

                for &did in &diagram_ids {
                    let theme = self.state.theme;
                    if let Some(diagram) = self.state.diagram_by_id_mut(did) {
                        ui.push_id(did, |ui| {
                            let action = diagram_panel::show_diagram_panel(
                                diagram,
                                ui,
                                &theme,
                                panel_height,
                            );
                            match action {
                                DiagramAction::None => {}
                                other => actions.push((did, other)),
                            }
                        });
                        ui.add_space(spacing);
                    }
                }
            });
        });

        // ------------------------------------------------------------------
        // 3. Process collected panel actions
        // ------------------------------------------------------------------
        for (did, action) in actions {
            match action {
                DiagramAction::Close => {
                    self.state.remove_diagram(did);
                }
                DiagramAction::AddData => {
                    self.open_file_dialog(did);
                }
                DiagramAction::OpenSettings => {
                    self.settings_dialog = Some(SettingsDialogState::new(did));
                }
                DiagramAction::ExportImageSave => {
                    self.pending_screenshot = Some(PendingScreenshot::SaveFile { diagram_id: did });
                    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(
                        egui::UserData::default(),
                    ));
                }
                DiagramAction::ExportImageClipboard => {
                    self.pending_screenshot =
                        Some(PendingScreenshot::Clipboard { diagram_id: did });
                    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(
                        egui::UserData::default(),
                    ));
                }
                DiagramAction::None => {}
            }
        }

        // ------------------------------------------------------------------
        // 3b. Poll async file load
        // ------------------------------------------------------------------
        if let Some(ref pending) = self.pending_load {
            let mut lock = pending.result.lock().unwrap();
            if let Some(result) = lock.take() {
                let diagram_id = pending.diagram_id;
                match result {
                    Ok(loaded_data) => {
                        self.column_dialog = Some(ColumnDialogState::new(loaded_data, diagram_id));
                    }
                    Err(e) => {
                        tracing::error!("Failed to load file: {e}");
                        self.error_message = Some(format!("Failed to load file: {e}"));
                    }
                }
                drop(lock);
                self.pending_load = None;
            }
        }

        if self.pending_load.is_some() {
            egui::Window::new("Loading")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Reading data file...");
                    });
                });
            ctx.request_repaint();
        }

        // ------------------------------------------------------------------
        // 4. Dialogs
        // ------------------------------------------------------------------
        if let Some(mut dialog_state) = self.column_dialog.take() {
            match crate::ui::column_dialog::show_column_dialog(ctx, &mut dialog_state) {
                Some(DialogResult::Ok(selection)) => {
                    self.column_dialog = Some(dialog_state);
                    self.process_column_selection(selection);
                }
                Some(DialogResult::Cancel) => {}
                None => {
                    self.column_dialog = Some(dialog_state);
                }
            }
        }

        if let Some(dialog_state) = self.settings_dialog.take() {
            let keep_open = match self.state.diagram_by_id_mut(dialog_state.diagram_id) {
                Some(diagram) => settings_dialog::show_settings_dialog(ctx, &dialog_state, diagram),
                None => false,
            };
            if keep_open {
                self.settings_dialog = Some(dialog_state);
            }
        }

        if self.show_about {
            let mut open = self.show_about;
            egui::Window::new("About TaylorPlot")
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(format!("TaylorPlot v{VERSION}"));
                    ui.add_space(6.0);
                    ui.label(
                        "Compares model series against a reference series on a Taylor \
                         diagram: radius is the standard deviation, angle encodes the \
                         correlation coefficient, and gray contour lines mark constant \
                         centered RMS difference.",
                    );
                    ui.add_space(6.0);
                    ui.label("Right-click the title for this menu.");
                });
            self.show_about = open;
        }
    }
}
