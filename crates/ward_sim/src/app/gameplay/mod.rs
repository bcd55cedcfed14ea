mod collaborators;
mod events;
mod hud;
mod motion;
mod persistence;
mod scene_impl;
mod session;
mod tasks;
mod timer;
mod zones;

pub(crate) use collaborators::NoScorer;
pub(crate) use persistence::{is_valid_session_id, latest_snapshot, load_snapshot};
pub(crate) use scene_impl::build_scene_machine;
pub(crate) use session::{SimConfig, WardSession, DEFAULT_MOUSE_SENSITIVITY, DEFAULT_SESSION_ID};
pub(crate) use timer::DEFAULT_SESSION_SECONDS;
