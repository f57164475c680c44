//! GUI-specific constants for window geometry and widget chrome

use egui;

pub const APP_TITLE: &str = "Overseer Dashboard";

/// Sized for a small wall-mounted touch screen
pub const WINDOW_WIDTH: f32 = 800.0;
pub const WINDOW_HEIGHT: f32 = 480.0;
pub const WINDOW_MIN_WIDTH: f32 = 800.0;
pub const WINDOW_MIN_HEIGHT: f32 = 480.0;

/// Dialog dimensions
pub const DIALOG_MIN_WIDTH: f32 = 320.0;
pub const DIALOG_MAX_HEIGHT: f32 = 420.0;

/// Widget chrome
pub const BUTTON_PADDING: i8 = 6;
pub const PANEL_PADDING: i8 = 8;
pub const CORNER_RADIUS: u8 = 4;
pub const ITEM_SPACING: f32 = 6.0;

/// Fallbacks for widgets the style sheet leaves unstyled
pub const DEFAULT_BUTTON_FILL: egui::Color32 = egui::Color32::from_rgb(45, 50, 56);
