/// A point on the horizontal plane (world x/z, height dropped).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapPoint {
    pub x: f32,
    pub z: f32,
}

impl MapPoint {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Neutral,
    Muted,
    Accent,
    Active,
    Blocked,
    Done,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawShape {
    Rect {
        min: MapPoint,
        max: MapPoint,
        tone: Tone,
    },
    Circle {
        center: MapPoint,
        radius: f32,
        tone: Tone,
    },
    /// `heading` is a unit direction on the plane.
    Marker {
        position: MapPoint,
        heading: MapPoint,
        tone: Tone,
    },
    Label {
        position: MapPoint,
        text: String,
        tone: Tone,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudLine {
    pub text: String,
    pub tone: Tone,
}

impl HudLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub title: String,
    pub lines: Vec<HudLine>,
    pub footer: Option<String>,
}

/// Everything a scene wants on screen for one frame. Scenes fill it in
/// `render`; the renderer rasterizes it afterwards.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    bounds: Option<(MapPoint, MapPoint)>,
    grid_spacing: Option<f32>,
    shapes: Vec<DrawShape>,
    hud_lines: Vec<HudLine>,
    prompt: Option<HudLine>,
    panel: Option<Panel>,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.bounds = None;
        self.grid_spacing = None;
        self.shapes.clear();
        self.hud_lines.clear();
        self.prompt = None;
        self.panel = None;
    }

    pub fn set_bounds(&mut self, min: MapPoint, max: MapPoint) {
        self.bounds = Some((min, max));
    }

    pub fn set_grid_spacing(&mut self, spacing: f32) {
        self.grid_spacing = (spacing > 0.0).then_some(spacing);
    }

    pub fn push_shape(&mut self, shape: DrawShape) {
        self.shapes.push(shape);
    }

    pub fn push_hud_line(&mut self, text: impl Into<String>, tone: Tone) {
        self.hud_lines.push(HudLine::new(text, tone));
    }

    pub fn set_prompt(&mut self, text: impl Into<String>, tone: Tone) {
        self.prompt = Some(HudLine::new(text, tone));
    }

    pub fn set_panel(&mut self, panel: Panel) {
        self.panel = Some(panel);
    }

    pub fn bounds(&self) -> Option<(MapPoint, MapPoint)> {
        self.bounds
    }

    pub fn grid_spacing(&self) -> Option<f32> {
        self.grid_spacing
    }

    pub fn shapes(&self) -> &[DrawShape] {
        &self.shapes
    }

    pub fn hud_lines(&self) -> &[HudLine] {
        &self.hud_lines
    }

    pub fn prompt(&self) -> Option<&HudLine> {
        self.prompt.as_ref()
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_every_layer() {
        let mut draw = DrawList::default();
        draw.set_bounds(MapPoint::new(-1.0, -1.0), MapPoint::new(1.0, 1.0));
        draw.set_grid_spacing(1.0);
        draw.push_hud_line("hello", Tone::Neutral);
        draw.set_prompt("press", Tone::Accent);
        draw.set_panel(Panel::default());

        draw.clear();

        assert!(draw.bounds().is_none());
        assert!(draw.grid_spacing().is_none());
        assert!(draw.hud_lines().is_empty());
        assert!(draw.prompt().is_none());
        assert!(draw.panel().is_none());
    }

    #[test]
    fn non_positive_grid_spacing_disables_grid() {
        let mut draw = DrawList::default();
        draw.set_grid_spacing(0.0);
        assert!(draw.grid_spacing().is_none());
    }
}
