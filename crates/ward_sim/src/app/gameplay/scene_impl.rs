use ward_engine::{DrawList, InputSnapshot, Scene, SceneCommand, SceneKey, SceneMachine};

use super::hud::render_session;
use super::session::WardSession;
use super::zones::{layout_for, SceneLayout};

/// A scene is its static layout; all mutable state lives in the session.
pub(crate) struct WardScene {
    layout: &'static SceneLayout,
}

impl WardScene {
    pub(crate) fn new(key: SceneKey) -> Self {
        Self {
            layout: layout_for(key),
        }
    }
}

impl Scene<WardSession> for WardScene {
    fn load(&mut self, session: &mut WardSession) {
        session.on_scene_loaded(self.layout);
    }

    fn update(
        &mut self,
        frame_dt_seconds: f32,
        input: &InputSnapshot,
        session: &mut WardSession,
    ) -> SceneCommand {
        session.update_frame(frame_dt_seconds, input, self.layout)
    }

    fn on_interval(&mut self, session: &mut WardSession) -> SceneCommand {
        session.on_interval()
    }

    fn render(&self, session: &WardSession, draw: &mut DrawList) {
        render_session(session, self.layout, draw);
    }

    fn unload(&mut self, session: &mut WardSession) {
        session.on_scene_unloaded();
    }

    fn debug_title(&self, session: &WardSession) -> Option<String> {
        Some(session.debug_title())
    }
}

pub(crate) fn build_scene_machine(active: SceneKey) -> SceneMachine<WardSession> {
    SceneMachine::new(
        Box::new(WardScene::new(SceneKey::Corridor)),
        Box::new(WardScene::new(SceneKey::Room)),
        active,
    )
}
