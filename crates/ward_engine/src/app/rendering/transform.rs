use super::draw::MapPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Top-down projection of the walkable plane. +z points up the screen and +x
/// points left, so the map reads the same way the player sees the scene when
/// facing +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MapView {
    center: MapPoint,
    pixels_per_world: f32,
    viewport: Viewport,
}

impl MapView {
    pub(crate) fn fit(min: MapPoint, max: MapPoint, viewport: Viewport, margin_px: f32) -> Self {
        let span_x = (max.x - min.x).abs().max(f32::EPSILON);
        let span_z = (max.z - min.z).abs().max(f32::EPSILON);
        let usable_width = (viewport.width as f32 - margin_px * 2.0).max(1.0);
        let usable_height = (viewport.height as f32 - margin_px * 2.0).max(1.0);

        Self {
            center: MapPoint::new((min.x + max.x) * 0.5, (min.z + max.z) * 0.5),
            pixels_per_world: (usable_width / span_x).min(usable_height / span_z),
            viewport,
        }
    }

    pub(crate) fn world_to_screen(&self, point: MapPoint) -> (i32, i32) {
        let x =
            self.viewport.width as f32 * 0.5 - (point.x - self.center.x) * self.pixels_per_world;
        let y =
            self.viewport.height as f32 * 0.5 - (point.z - self.center.z) * self.pixels_per_world;
        (x.round() as i32, y.round() as i32)
    }

    pub(crate) fn length_to_px(&self, length: f32) -> i32 {
        (length * self.pixels_per_world).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn bounds_center_maps_to_viewport_center() {
        let view = MapView::fit(
            MapPoint::new(-2.0, -2.0),
            MapPoint::new(2.0, 24.0),
            VIEWPORT,
            0.0,
        );
        assert_eq!(view.world_to_screen(MapPoint::new(0.0, 11.0)), (400, 300));
    }

    #[test]
    fn tall_bounds_are_limited_by_height() {
        let view = MapView::fit(
            MapPoint::new(-2.0, -2.0),
            MapPoint::new(2.0, 24.0),
            VIEWPORT,
            20.0,
        );
        assert_eq!(view.length_to_px(26.0), 560);
    }

    #[test]
    fn positive_z_is_up_and_positive_x_is_left() {
        let view = MapView::fit(
            MapPoint::new(-5.0, -5.0),
            MapPoint::new(5.0, 5.0),
            VIEWPORT,
            0.0,
        );
        let (origin_x, origin_y) = view.world_to_screen(MapPoint::new(0.0, 0.0));
        let (x, y) = view.world_to_screen(MapPoint::new(1.0, 1.0));

        assert!(x < origin_x);
        assert!(y < origin_y);
    }
}
