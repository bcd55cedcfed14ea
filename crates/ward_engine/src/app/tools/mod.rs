mod hud;
mod overlay;
mod text;

pub(crate) use hud::draw_hud;
pub(crate) use overlay::{draw_debug_overlay, OverlayData};
pub(crate) use text::draw_text;
