mod draw;
mod raster;
mod renderer;
mod transform;

pub use draw::{DrawList, DrawShape, HudLine, MapPoint, Panel, Tone};
pub(crate) use raster::{fill_rect, rect_outline, write_pixel_rgba};
pub(crate) use renderer::tone_color;
pub use renderer::Renderer;
pub use transform::Viewport;
