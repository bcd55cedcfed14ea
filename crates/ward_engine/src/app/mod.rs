mod capture;
mod input;
mod interval;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod tools;

pub use capture::{CaptureError, CaptureState};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{DrawList, DrawShape, HudLine, MapPoint, Panel, Renderer, Tone, Viewport};
pub use scene::{InputSnapshot, Scene, SceneCommand, SceneKey, SceneMachine};
