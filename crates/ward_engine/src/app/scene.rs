use tracing::info;

use super::input::{ActionStates, InputAction};
use super::rendering::DrawList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Corridor,
    Room,
}

impl SceneKey {
    pub fn other(self) -> Self {
        match self {
            SceneKey::Corridor => SceneKey::Room,
            SceneKey::Room => SceneKey::Corridor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SceneKey::Corridor => "corridor",
            SceneKey::Room => "room",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    AcquireCapture,
    ReleaseCapture,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    look_delta: (f32, f32),
    capture_active: bool,
    capture_denied: bool,
    primary_click_pressed: bool,
    interact_pressed: bool,
    cancel_pressed: bool,
    confirm_pressed: bool,
    menu_toggle_pressed: bool,
    palette_pressed: bool,
    nav_steps: i32,
    typed_text: String,
    backspace_count: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Raw pointer motion since the last frame, in device units.
    pub fn look_delta(&self) -> (f32, f32) {
        self.look_delta
    }

    pub fn capture_active(&self) -> bool {
        self.capture_active
    }

    /// True on the single frame after the window refused a capture request.
    pub fn capture_denied(&self) -> bool {
        self.capture_denied
    }

    pub fn primary_click_pressed(&self) -> bool {
        self.primary_click_pressed
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn cancel_pressed(&self) -> bool {
        self.cancel_pressed
    }

    pub fn confirm_pressed(&self) -> bool {
        self.confirm_pressed
    }

    pub fn menu_toggle_pressed(&self) -> bool {
        self.menu_toggle_pressed
    }

    pub fn palette_pressed(&self) -> bool {
        self.palette_pressed
    }

    /// Net list navigation this frame; negative moves up.
    pub fn nav_steps(&self) -> i32 {
        self.nav_steps
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    pub fn backspace_count(&self) -> u32 {
        self.backspace_count
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub(crate) fn with_actions(mut self, actions: ActionStates) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_look_delta(mut self, dx: f32, dy: f32) -> Self {
        self.look_delta = (dx, dy);
        self
    }

    pub fn with_capture_active(mut self, capture_active: bool) -> Self {
        self.capture_active = capture_active;
        self
    }

    pub fn with_capture_denied(mut self, capture_denied: bool) -> Self {
        self.capture_denied = capture_denied;
        self
    }

    pub fn with_primary_click_pressed(mut self, pressed: bool) -> Self {
        self.primary_click_pressed = pressed;
        self
    }

    pub fn with_interact_pressed(mut self, pressed: bool) -> Self {
        self.interact_pressed = pressed;
        self
    }

    pub fn with_cancel_pressed(mut self, pressed: bool) -> Self {
        self.cancel_pressed = pressed;
        self
    }

    pub fn with_confirm_pressed(mut self, pressed: bool) -> Self {
        self.confirm_pressed = pressed;
        self
    }

    pub fn with_menu_toggle_pressed(mut self, pressed: bool) -> Self {
        self.menu_toggle_pressed = pressed;
        self
    }

    pub fn with_palette_pressed(mut self, pressed: bool) -> Self {
        self.palette_pressed = pressed;
        self
    }

    pub fn with_nav_steps(mut self, nav_steps: i32) -> Self {
        self.nav_steps = nav_steps;
        self
    }

    pub fn with_typed_text(mut self, text: impl Into<String>) -> Self {
        self.typed_text = text.into();
        self
    }

    pub fn with_backspace_count(mut self, count: u32) -> Self {
        self.backspace_count = count;
        self
    }
}

/// A scene is a stateless-ish view over a shared session `S`: every callback
/// receives the session by `&mut`, so state survives scene swaps.
pub trait Scene<S> {
    fn load(&mut self, session: &mut S);
    fn update(&mut self, frame_dt_seconds: f32, input: &InputSnapshot, session: &mut S)
        -> SceneCommand;
    /// Called once per elapsed interval (one second by default).
    fn on_interval(&mut self, _session: &mut S) -> SceneCommand {
        SceneCommand::None
    }
    fn render(&self, session: &S, draw: &mut DrawList);
    fn unload(&mut self, session: &mut S);
    fn debug_title(&self, _session: &S) -> Option<String> {
        None
    }
}

struct SceneRuntime<S> {
    scene: Box<dyn Scene<S>>,
    is_loaded: bool,
}

impl<S> SceneRuntime<S> {
    fn new(scene: Box<dyn Scene<S>>) -> Self {
        Self {
            scene,
            is_loaded: false,
        }
    }

    fn load(&mut self, session: &mut S) {
        if !self.is_loaded {
            self.scene.load(session);
            self.is_loaded = true;
        }
    }

    fn unload(&mut self, session: &mut S) {
        if self.is_loaded {
            self.scene.unload(session);
            self.is_loaded = false;
        }
    }
}

/// Owns both scenes; exactly one is active and loaded at a time.
pub struct SceneMachine<S> {
    corridor: SceneRuntime<S>,
    room: SceneRuntime<S>,
    active_scene: SceneKey,
}

impl<S> SceneMachine<S> {
    pub fn new(
        corridor: Box<dyn Scene<S>>,
        room: Box<dyn Scene<S>>,
        active_scene: SceneKey,
    ) -> Self {
        Self {
            corridor: SceneRuntime::new(corridor),
            room: SceneRuntime::new(room),
            active_scene,
        }
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn load_active(&mut self, session: &mut S) {
        self.active_runtime_mut().load(session);
    }

    pub fn update_active(
        &mut self,
        frame_dt_seconds: f32,
        input: &InputSnapshot,
        session: &mut S,
    ) -> SceneCommand {
        self.active_runtime_mut()
            .scene
            .update(frame_dt_seconds, input, session)
    }

    pub fn interval_active(&mut self, session: &mut S) -> SceneCommand {
        self.active_runtime_mut().scene.on_interval(session)
    }

    pub fn render_active(&self, session: &S, draw: &mut DrawList) {
        self.active_runtime().scene.render(session, draw);
    }

    pub fn debug_title_active(&self, session: &S) -> Option<String> {
        self.active_runtime().scene.debug_title(session)
    }

    /// Unloads the current scene and loads `next_scene`. Returns false when
    /// `next_scene` is already active.
    pub fn switch_to(&mut self, next_scene: SceneKey, session: &mut S) -> bool {
        if self.active_scene == next_scene {
            return false;
        }

        self.active_runtime_mut().unload(session);
        let previous = self.active_scene;
        self.active_scene = next_scene;
        self.active_runtime_mut().load(session);
        info!(
            from = previous.as_str(),
            to = next_scene.as_str(),
            "scene_switched"
        );
        true
    }

    pub fn shutdown_all(&mut self, session: &mut S) {
        self.corridor.unload(session);
        self.room.unload(session);
    }

    fn active_runtime(&self) -> &SceneRuntime<S> {
        match self.active_scene {
            SceneKey::Corridor => &self.corridor,
            SceneKey::Room => &self.room,
        }
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime<S> {
        match self.active_scene {
            SceneKey::Corridor => &mut self.corridor,
            SceneKey::Room => &mut self.room,
        }
    }
}
