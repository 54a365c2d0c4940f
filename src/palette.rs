use tui::style::{Color, Modifier, Style};
use once_cell::sync::Lazy;

use rime::config::{ColorConfig, Config};

/*──────────────────────── 1. Kanagawa palette (RGB) ───────────────────────*/
/// Named Kanagawa tones as **true RGB**, identical on every terminal.
#[allow(non_snake_case)]
pub mod KANAGAWA {
    use tui::style::Color;

    pub const PUMICE:    Color = Color::Rgb(114, 113, 105);
    pub const SKY_GLAZE: Color = Color::Rgb(126, 156, 216);
}

/*──────────────────────── Load configured colors ──────────────────────────*/
pub static CONFIG_COLORS: Lazy<ColorConfig> = Lazy::new(|| {
    Config::load()
        .map(|c| c.colors)
        .unwrap_or_default()
});

// Helper to convert RGB array to Color
#[inline]
pub fn rgb(arr: [u8; 3]) -> Color {
    Color::Rgb(arr[0], arr[1], arr[2])
}

/*──────────────────────── 2. Style shortcuts used throughout the UI ───────*/
/// Central place to theme every widget.
#[allow(non_snake_case)]
pub mod STYLE {
    use super::{Modifier, Style};
    const EMPTY: Modifier = Modifier::empty();

    pub fn default_bg() -> Style { Style { fg: None, bg: Some(super::rgb(super::CONFIG_COLORS.default_bg)), add_modifier: EMPTY, sub_modifier: EMPTY } }

    /* ─── panes ─── */
    pub fn border() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.border)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }
    pub fn border_focus() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.border_focus)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }
    pub fn title() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.title)), bg: None, add_modifier: Modifier::BOLD, sub_modifier: EMPTY } }

    /* ─── grids ─── */
    pub fn header_row() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.header_row)), bg: None, add_modifier: Modifier::BOLD, sub_modifier: EMPTY } }
    pub fn cell() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.cell_fg)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }
    pub fn bold_cell() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.cell_fg)), bg: None, add_modifier: Modifier::BOLD, sub_modifier: EMPTY } }
    pub fn selection() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.selection_fg)), bg: Some(super::rgb(super::CONFIG_COLORS.selection_bg)), add_modifier: EMPTY, sub_modifier: EMPTY } }
    pub fn caption() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.caption_fg)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }

    /* ─── status ─── */
    pub fn status_fg() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.status_fg)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }
    pub fn error_fg() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.error_fg)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }
    pub fn info_fg() -> Style { Style { fg: Some(super::rgb(super::CONFIG_COLORS.info_fg)), bg: None, add_modifier: EMPTY, sub_modifier: EMPTY } }
}
