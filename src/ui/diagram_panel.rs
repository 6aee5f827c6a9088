use crate::processing::metrics;
use crate::render::figure_painter;
use crate::state::diagram_state::DiagramState;
use crate::state::theme::Theme;

/// Actions that the diagram panel can request from the parent.
pub enum DiagramAction {
    None,
    Close,
    AddData,
    OpenSettings,
    ExportImageSave,
    ExportImageClipboard,
}

/// Helper to create a toolbar button with consistent min size.
fn toolbar_btn(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(egui::Button::new(label).min_size(egui::vec2(0.0, 26.0)))
}

/// Helper to create a selected/toggled toolbar button.
fn toolbar_toggle_btn(ui: &mut egui::Ui, label: &str, active: bool) -> egui::Response {
    let btn = if active {
        egui::Button::new(egui::RichText::new(label).strong())
            .fill(ui.visuals().selection.bg_fill)
            .min_size(egui::vec2(0.0, 26.0))
    } else {
        egui::Button::new(label).min_size(egui::vec2(0.0, 26.0))
    };
    ui.add(btn)
}

/// Render a single diagram panel. Returns an action if the user clicked a
/// button. `panel_height` is the target total height for this panel.
pub fn show_diagram_panel(
    diagram: &mut DiagramState,
    ui: &mut egui::Ui,
    theme: &Theme,
    panel_height: f32,
) -> DiagramAction {
    let mut action = DiagramAction::None;

    let frame_resp = egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(10))
        .corner_radius(egui::CornerRadius::same(8))
        .show(ui, |ui| {
            // --- Title row ---
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut diagram.title)
                        .font(egui::TextStyle::Heading)
                        .desired_width(ui.available_width() - 90.0),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let close_btn = egui::Button::new(
                        egui::RichText::new("Close").color(egui::Color32::from_rgb(220, 60, 60)),
                    )
                    .min_size(egui::vec2(0.0, 26.0));
                    if ui.add(close_btn).on_hover_text("Remove this diagram").clicked() {
                        action = DiagramAction::Close;
                    }
                });
            });

            ui.add_space(2.0);

            // --- Toolbar row ---
            ui.horizontal_wrapped(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                if toolbar_btn(ui, "Add Data")
                    .on_hover_text("Import a CSV or Excel model table")
                    .clicked()
                {
                    action = DiagramAction::AddData;
                }

                let remove_popup_id = ui.make_persistent_id(format!("remove_popup_{}", diagram.id));
                let remove_btn_resp =
                    toolbar_btn(ui, "Remove Models").on_hover_text("Remove models from the diagram");
                if remove_btn_resp.clicked() {
                    diagram.remove_selected = vec![false; diagram.samples.len()];
                    ui.memory_mut(|m| m.toggle_popup(remove_popup_id));
                }
                egui::popup_below_widget(
                    ui,
                    remove_popup_id,
                    &remove_btn_resp,
                    egui::PopupCloseBehavior::CloseOnClickOutside,
                    |ui| {
                        ui.set_min_width(220.0);
                        show_remove_popup(diagram, ui, remove_popup_id);
                    },
                );

                if toolbar_btn(ui, "Settings")
                    .on_hover_text("Axis range, negative correlations, contour levels")
                    .clicked()
                {
                    action = DiagramAction::OpenSettings;
                }

                ui.separator();

                if toolbar_toggle_btn(ui, "Grid", diagram.config.show_grid)
                    .on_hover_text("Toggle the polar grid")
                    .clicked()
                {
                    diagram.config.show_grid = !diagram.config.show_grid;
                }
                if toolbar_toggle_btn(ui, "RMS Contours", diagram.config.show_contours)
                    .on_hover_text("Toggle centered-RMS difference contours")
                    .clicked()
                {
                    diagram.config.show_contours = !diagram.config.show_contours;
                }
                if toolbar_toggle_btn(ui, "Statistics", diagram.config.show_table)
                    .on_hover_text("Toggle the per-model statistics table")
                    .clicked()
                {
                    diagram.config.show_table = !diagram.config.show_table;
                }

                ui.separator();

                if toolbar_btn(ui, "Export PNG")
                    .on_hover_text("Save the diagram as a PNG image")
                    .clicked()
                {
                    action = DiagramAction::ExportImageSave;
                }
                if toolbar_btn(ui, "Copy Image")
                    .on_hover_text("Copy the diagram to the clipboard")
                    .clicked()
                {
                    action = DiagramAction::ExportImageClipboard;
                }
            });

            ui.add_space(4.0);

            let content_height = (panel_height - 110.0).max(220.0);
            if diagram.config.show_table {
                show_stats_table(diagram, ui, content_height);
            } else {
                show_figure(diagram, ui, theme, content_height);
            }
        });

    diagram.last_frame_rect = Some(frame_resp.response.rect);

    action
}

fn show_figure(diagram: &DiagramState, ui: &mut egui::Ui, theme: &Theme, height: f32) {
    let desired = egui::vec2(ui.available_width(), height);
    let (rect, _response) = ui.allocate_exact_size(desired, egui::Sense::hover());
    let painter = ui.painter_at(rect);

    match diagram.build_diagram(theme.axis_rgba()) {
        Ok(Some(taylor)) => {
            let figure = taylor.to_figure(&theme.diagram_palette());
            figure_painter::paint_figure(
                &painter,
                rect,
                &figure,
                theme.plot_bg(),
                theme.legend_bg(),
            );
        }
        Ok(None) => {
            painter.rect_filled(rect, 0.0, theme.plot_bg());
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Click \"Add Data\" to load a model table.",
                egui::FontId::proportional(14.0),
                ui.visuals().weak_text_color(),
            );
        }
        Err(e) => {
            painter.rect_filled(rect, 0.0, theme.plot_bg());
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                format!("Cannot build diagram: {e}"),
                egui::FontId::proportional(13.0),
                egui::Color32::from_rgb(255, 80, 80),
            );
        }
    }
}

fn show_remove_popup(diagram: &mut DiagramState, ui: &mut egui::Ui, popup_id: egui::Id) {
    if diagram.samples.is_empty() {
        ui.label(egui::RichText::new("No models to remove.").weak());
        return;
    }

    ui.label(egui::RichText::new("Select models to remove:").strong());
    ui.add_space(4.0);
    if diagram.remove_selected.len() != diagram.samples.len() {
        diagram.remove_selected.resize(diagram.samples.len(), false);
    }
    for (i, sample) in diagram.samples.iter().enumerate() {
        let color = egui::Color32::from_rgba_unmultiplied(
            sample.color[0],
            sample.color[1],
            sample.color[2],
            sample.color[3],
        );
        ui.checkbox(
            &mut diagram.remove_selected[i],
            egui::RichText::new(&sample.label).color(color),
        );
    }
    ui.add_space(4.0);

    let any_selected = diagram.remove_selected.iter().any(|&s| s);
    let del_btn = ui.add_enabled(
        any_selected,
        egui::Button::new(
            egui::RichText::new("Remove Selected").color(egui::Color32::from_rgb(220, 60, 60)),
        )
        .min_size(egui::vec2(0.0, 28.0)),
    );
    if del_btn.clicked() {
        let to_remove: Vec<usize> = diagram
            .remove_selected
            .iter()
            .enumerate()
            .filter(|(_, &sel)| sel)
            .map(|(i, _)| i)
            .collect();
        // Back to front so indices stay valid.
        for &i in to_remove.iter().rev() {
            diagram.remove_sample(i);
        }
        diagram.remove_selected = vec![false; diagram.samples.len()];
        ui.memory_mut(|m| m.toggle_popup(popup_id));
    }
}

fn show_stats_table(diagram: &DiagramState, ui: &mut egui::Ui, height: f32) {
    let ref_std = match diagram.ref_std {
        Some(v) => v,
        None => {
            ui.label("No data loaded.");
            return;
        }
    };

    use egui_extras::{Column, TableBuilder};

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(110.0), 4)
        .min_scrolled_height(height)
        .header(20.0, |mut header| {
            for title in ["Series", "Std Dev", "Correlation", "Centered RMS"] {
                header.col(|ui| {
                    ui.label(egui::RichText::new(title).strong());
                });
            }
        })
        .body(|mut body| {
            // Reference row first, mirroring the legend order.
            body.row(18.0, |mut row| {
                row.col(|ui| {
                    ui.label(egui::RichText::new(&diagram.ref_label).strong());
                });
                row.col(|ui| {
                    ui.label(format!("{ref_std:.4}"));
                });
                row.col(|ui| {
                    ui.label("1.0000");
                });
                row.col(|ui| {
                    ui.label("0.0000");
                });
            });

            for sample in &diagram.samples {
                body.row(18.0, |mut row| {
                    let rms = metrics::centered_rms(ref_std, sample.std_dev, sample.correlation);
                    row.col(|ui| {
                        let color = egui::Color32::from_rgba_unmultiplied(
                            sample.color[0],
                            sample.color[1],
                            sample.color[2],
                            sample.color[3],
                        );
                        ui.label(egui::RichText::new(&sample.label).color(color));
                    });
                    row.col(|ui| {
                        ui.label(fmt_stat(sample.std_dev));
                    });
                    row.col(|ui| {
                        ui.label(fmt_stat(sample.correlation));
                    });
                    row.col(|ui| {
                        ui.label(fmt_stat(rms));
                    });
                });
            }
        });
}

fn fmt_stat(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.4}")
    } else {
        "undefined".to_string()
    }
}
