pub mod alert_overlay;
pub mod help_overlay;
pub mod processing_panel;
pub mod results_panel;
pub mod upload_panel;
