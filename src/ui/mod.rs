pub mod column_dialog;
pub mod diagram_panel;
pub mod settings_dialog;
