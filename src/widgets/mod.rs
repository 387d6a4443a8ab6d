pub mod filter_panel;
pub mod occurrence_table;
pub mod viz;

use ratatui::style::Color;

/// Fixed palette shared by the panels.
pub(crate) const BORDER: Color = Color::DarkGray;
pub(crate) const BORDER_ACTIVE: Color = Color::Cyan;
pub(crate) const TEXT_PRIMARY: Color = Color::Gray;
pub(crate) const TEXT_DIM: Color = Color::DarkGray;
pub(crate) const ACCENT: Color = Color::LightGreen;
pub(crate) const WARNING: Color = Color::Yellow;
