use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::draw::{DrawList, DrawShape, MapPoint, Tone};
use super::raster::{circle_outline, clear, draw_line, fill_rect, rect_outline};
use super::transform::{MapView, Viewport};
use crate::app::tools::{draw_debug_overlay, draw_hud, draw_text, OverlayData};

const CLEAR_COLOR: [u8; 4] = [14, 17, 22, 255];
const FLOOR_COLOR: [u8; 4] = [24, 29, 36, 255];
const GRID_COLOR: [u8; 4] = [34, 40, 50, 255];
const BOUNDARY_COLOR: [u8; 4] = [120, 132, 150, 255];
const MAP_MARGIN_PX: f32 = 48.0;
const MARKER_HALF_SIZE_PX: i32 = 5;
const MARKER_HEADING_PX: f32 = 18.0;

pub(crate) fn tone_color(tone: Tone) -> [u8; 4] {
    match tone {
        Tone::Neutral => [214, 222, 232, 255],
        Tone::Muted => [128, 140, 158, 255],
        Tone::Accent => [96, 196, 210, 255],
        Tone::Active => [250, 210, 90, 255],
        Tone::Blocked => [226, 92, 86, 255],
        Tone::Done => [120, 200, 120, 255],
        Tone::Warning => [238, 150, 64, 255],
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let width = width.max(1);
        let height = height.max(1);
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render(
        &mut self,
        draw: &DrawList,
        overlay: Option<&OverlayData>,
    ) -> Result<(), Error> {
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        rasterize(frame, viewport, draw);
        if let Some(overlay) = overlay {
            draw_debug_overlay(frame, viewport.width, viewport.height, overlay);
        }
        self.pixels.render()
    }
}

pub(crate) fn rasterize(frame: &mut [u8], viewport: Viewport, draw: &DrawList) {
    clear(frame, CLEAR_COLOR);
    if viewport.width == 0 || viewport.height == 0 {
        return;
    }

    if let Some((min, max)) = draw.bounds() {
        let view = MapView::fit(min, max, viewport, MAP_MARGIN_PX);
        draw_floor(frame, viewport, &view, min, max, draw.grid_spacing());
        for shape in draw.shapes() {
            draw_shape(frame, viewport, &view, shape);
        }
    }

    draw_hud(frame, viewport.width, viewport.height, draw);
}

fn draw_floor(
    frame: &mut [u8],
    viewport: Viewport,
    view: &MapView,
    min: MapPoint,
    max: MapPoint,
    grid_spacing: Option<f32>,
) {
    let (x0, y0) = view.world_to_screen(min);
    let (x1, y1) = view.world_to_screen(max);
    let (left, right) = (x0.min(x1), x0.max(x1));
    let (top, bottom) = (y0.min(y1), y0.max(y1));
    let (width, height) = (viewport.width, viewport.height);
    fill_rect(frame, width, height, left, top, right - left, bottom - top, FLOOR_COLOR);

    if let Some(spacing) = grid_spacing {
        let mut x = (min.x / spacing).ceil() * spacing;
        while x < max.x {
            let (sx, _) = view.world_to_screen(MapPoint::new(x, min.z));
            fill_rect(frame, width, height, sx, top, 1, bottom - top, GRID_COLOR);
            x += spacing;
        }
        let mut z = (min.z / spacing).ceil() * spacing;
        while z < max.z {
            let (_, sy) = view.world_to_screen(MapPoint::new(min.x, z));
            fill_rect(frame, width, height, left, sy, right - left, 1, GRID_COLOR);
            z += spacing;
        }
    }

    rect_outline(
        frame,
        width,
        height,
        left,
        top,
        right - left + 1,
        bottom - top + 1,
        BOUNDARY_COLOR,
    );
}

fn draw_shape(frame: &mut [u8], viewport: Viewport, view: &MapView, shape: &DrawShape) {
    let (width, height) = (viewport.width, viewport.height);
    match shape {
        DrawShape::Rect { min, max, tone } => {
            let (x0, y0) = view.world_to_screen(*min);
            let (x1, y1) = view.world_to_screen(*max);
            let left = x0.min(x1);
            let top = y0.min(y1);
            rect_outline(
                frame,
                width,
                height,
                left,
                top,
                (x1 - x0).abs() + 1,
                (y1 - y0).abs() + 1,
                tone_color(*tone),
            );
        }
        DrawShape::Circle {
            center,
            radius,
            tone,
        } => {
            circle_outline(
                frame,
                width,
                height,
                view.world_to_screen(*center),
                view.length_to_px(*radius),
                tone_color(*tone),
            );
        }
        DrawShape::Marker {
            position,
            heading,
            tone,
        } => {
            let color = tone_color(*tone);
            let (x, y) = view.world_to_screen(*position);
            fill_rect(
                frame,
                width,
                height,
                x - MARKER_HALF_SIZE_PX,
                y - MARKER_HALF_SIZE_PX,
                MARKER_HALF_SIZE_PX * 2 + 1,
                MARKER_HALF_SIZE_PX * 2 + 1,
                color,
            );
            // Screen x runs opposite to world x on the map.
            let tip = (
                x - (heading.x * MARKER_HEADING_PX).round() as i32,
                y - (heading.z * MARKER_HEADING_PX).round() as i32,
            );
            draw_line(frame, width, height, (x, y), tip, color);
        }
        DrawShape::Label {
            position,
            text,
            tone,
        } => {
            let (x, y) = view.world_to_screen(*position);
            draw_text(frame, width, height, x, y, text, tone_color(*tone));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 200,
        height: 200,
    };

    fn pixel(frame: &[u8], x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * VIEWPORT.width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn empty_draw_list_only_clears() {
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        rasterize(&mut frame, VIEWPORT, &DrawList::default());
        assert_eq!(pixel(&frame, 100, 100), CLEAR_COLOR);
    }

    #[test]
    fn marker_is_drawn_at_mapped_position() {
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        let mut draw = DrawList::default();
        draw.set_bounds(MapPoint::new(-5.0, -5.0), MapPoint::new(5.0, 5.0));
        draw.push_shape(DrawShape::Marker {
            position: MapPoint::new(0.0, 0.0),
            heading: MapPoint::new(0.0, 1.0),
            tone: Tone::Active,
        });

        rasterize(&mut frame, VIEWPORT, &draw);

        assert_eq!(pixel(&frame, 100, 100), tone_color(Tone::Active));
        // Heading +z points up the screen.
        assert_eq!(pixel(&frame, 100, 100 - 15), tone_color(Tone::Active));
    }
}
