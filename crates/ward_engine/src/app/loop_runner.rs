use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::capture::PointerCapture;
use super::input::ActionStates;
use super::interval::IntervalClock;
use super::metrics::MetricsAccumulator;
use super::tools::OverlayData;
use super::{DrawList, InputAction, InputSnapshot, Renderer, SceneCommand, SceneMachine};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub interval: Duration,
    pub max_intervals_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub overlay_visible: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Ward Round".to_string(),
            window_width: 1280,
            window_height: 720,
            max_frame_delta: Duration::from_millis(250),
            interval: Duration::from_secs(1),
            max_intervals_per_frame: 2,
            metrics_log_interval: Duration::from_secs(5),
            overlay_visible: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Runs the window loop until the window closes or a scene returns
/// [`SceneCommand::Quit`]. Every loaded scene is unloaded before returning.
pub fn run_app<S>(
    config: LoopConfig,
    mut session: S,
    mut scenes: SceneMachine<S>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let mut interval_clock = IntervalClock::new(config.interval, config.max_intervals_per_frame);
    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        interval_ms = config.interval.as_millis() as u64,
        max_intervals_per_frame = interval_clock.max_ticks_per_frame(),
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    scenes.load_active(&mut session);
    info!(scene = scenes.active_scene().as_str(), "scene_loaded");

    let mut input_collector = InputCollector::default();
    let mut capture = PointerCapture::default();
    let mut draw_list = DrawList::default();
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut overlay_visible = config.overlay_visible;
    let mut dropped_interval_total = Duration::ZERO;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => {
                    input_collector.clear_held();
                    if capture.release(window.as_ref()) {
                        info!(reason = "focus_lost", "capture_released");
                    }
                }
                WindowEvent::ModifiersChanged(modifiers) => {
                    input_collector.set_control_down(modifiers.state().control_key());
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::RedrawRequested => {
                    if input_collector.take_overlay_toggle_pressed() {
                        overlay_visible = !overlay_visible;
                        info!(overlay_visible, "overlay_toggled");
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    let snapshot = input_collector
                        .snapshot_for_frame(capture.is_locked(), capture.take_denied());
                    let command = scenes.update_active(
                        clamped_frame_dt.as_secs_f32(),
                        &snapshot,
                        &mut session,
                    );
                    if apply_scene_command(
                        command,
                        &mut scenes,
                        &mut session,
                        &mut capture,
                        &window,
                    ) {
                        window_target.exit();
                        return;
                    }

                    // The countdown follows wall time, so it sees the raw delta.
                    let plan = interval_clock.advance(raw_frame_dt);
                    for _ in 0..plan.ticks_to_run {
                        metrics_accumulator.record_interval();
                        let command = scenes.interval_active(&mut session);
                        if apply_scene_command(
                            command,
                            &mut scenes,
                            &mut session,
                            &mut capture,
                            &window,
                        ) {
                            window_target.exit();
                            return;
                        }
                    }
                    if plan.dropped_backlog > Duration::ZERO {
                        dropped_interval_total =
                            dropped_interval_total.saturating_add(plan.dropped_backlog);
                        warn!(
                            dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                            max_intervals_per_frame = interval_clock.max_ticks_per_frame(),
                            "interval_backlog_dropped"
                        );
                    }

                    draw_list.clear();
                    scenes.render_active(&session, &mut draw_list);
                    let overlay = overlay_visible.then(|| OverlayData {
                        metrics: metrics_accumulator.latest(),
                        scene: scenes.active_scene(),
                        capture: capture.state(),
                        dropped_interval_ms: dropped_interval_total.as_millis() as u64,
                    });
                    if let Err(error) = renderer.render(&draw_list, overlay.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }

                    let next_title = scenes.debug_title_active(&session);
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }

                    metrics_accumulator.record_frame(raw_frame_dt);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            ips = snapshot.ips,
                            frame_time_ms = snapshot.frame_time_ms,
                            scene = scenes.active_scene().as_str(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                if capture.is_locked() {
                    input_collector.add_look_delta(delta.0 as f32, delta.1 as f32);
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scenes.shutdown_all(&mut session);
                capture.release(window.as_ref());
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Applies one scene command. Returns true when the loop should exit.
fn apply_scene_command<S>(
    command: SceneCommand,
    scenes: &mut SceneMachine<S>,
    session: &mut S,
    capture: &mut PointerCapture,
    window: &Window,
) -> bool {
    match command {
        SceneCommand::None => {}
        SceneCommand::SwitchTo(next_scene) => {
            scenes.switch_to(next_scene, session);
        }
        SceneCommand::AcquireCapture => match capture.acquire(window) {
            Ok(true) => info!("capture_acquired"),
            Ok(false) => {}
            Err(error) => warn!(error = %error, "capture_denied"),
        },
        SceneCommand::ReleaseCapture => {
            if capture.release(window) {
                info!(reason = "scene_request", "capture_released");
            }
        }
        SceneCommand::Quit => {
            info!(reason = "scene_quit", "shutdown_requested");
            return true;
        }
    }
    false
}

#[derive(Debug, Clone, Copy, Default)]
struct EdgeKey {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeKey {
    fn update(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    action_states: ActionStates,
    control_down: bool,
    interact: EdgeKey,
    cancel: EdgeKey,
    confirm: EdgeKey,
    menu_toggle: EdgeKey,
    palette: EdgeKey,
    overlay_toggle: EdgeKey,
    nav_up: EdgeKey,
    nav_down: EdgeKey,
    primary_click: EdgeKey,
    look_delta: (f32, f32),
    typed_text: String,
    backspace_count: u32,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_key(
            key_event.physical_key,
            key_event.state,
            key_event.text.as_deref(),
        );
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState, text: Option<&str>) {
        let is_pressed = state == ElementState::Pressed;
        if let PhysicalKey::Code(code) = key {
            match code {
                KeyCode::KeyW | KeyCode::ArrowUp => {
                    self.action_states.set(InputAction::MoveForward, is_pressed);
                    self.nav_up.update(state);
                }
                KeyCode::KeyS | KeyCode::ArrowDown => {
                    self.action_states.set(InputAction::MoveBackward, is_pressed);
                    self.nav_down.update(state);
                }
                KeyCode::KeyA | KeyCode::ArrowLeft => {
                    self.action_states.set(InputAction::MoveLeft, is_pressed);
                }
                KeyCode::KeyD | KeyCode::ArrowRight => {
                    self.action_states.set(InputAction::MoveRight, is_pressed);
                }
                KeyCode::KeyE => self.interact.update(state),
                KeyCode::Escape => self.cancel.update(state),
                KeyCode::Enter | KeyCode::NumpadEnter => self.confirm.update(state),
                KeyCode::Tab => self.menu_toggle.update(state),
                KeyCode::KeyK if self.control_down || !is_pressed => self.palette.update(state),
                KeyCode::F3 => self.overlay_toggle.update(state),
                KeyCode::ControlLeft | KeyCode::ControlRight => self.control_down = is_pressed,
                KeyCode::Backspace if is_pressed => {
                    self.backspace_count = self.backspace_count.saturating_add(1);
                }
                _ => {}
            }
        }

        if is_pressed && !self.control_down {
            if let Some(text) = text {
                self.typed_text
                    .extend(text.chars().filter(|ch| !ch.is_control()));
            }
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.primary_click.update(state);
        }
    }

    fn set_control_down(&mut self, control_down: bool) {
        self.control_down = control_down;
    }

    fn add_look_delta(&mut self, dx: f32, dy: f32) {
        self.look_delta.0 += dx;
        self.look_delta.1 += dy;
    }

    /// Drops held keys, e.g. when focus moves away and releases may be missed.
    fn clear_held(&mut self) {
        self.action_states.clear();
        self.control_down = false;
        self.look_delta = (0.0, 0.0);
    }

    fn take_overlay_toggle_pressed(&mut self) -> bool {
        self.overlay_toggle.take()
    }

    fn snapshot_for_frame(&mut self, capture_active: bool, capture_denied: bool) -> InputSnapshot {
        let nav_steps = i32::from(self.nav_down.take()) - i32::from(self.nav_up.take());
        let (dx, dy) = std::mem::take(&mut self.look_delta);
        InputSnapshot::empty()
            .with_actions(self.action_states)
            .with_look_delta(dx, dy)
            .with_capture_active(capture_active)
            .with_capture_denied(capture_denied)
            .with_primary_click_pressed(self.primary_click.take())
            .with_interact_pressed(self.interact.take())
            .with_cancel_pressed(self.cancel.take())
            .with_confirm_pressed(self.confirm.take())
            .with_menu_toggle_pressed(self.menu_toggle.take())
            .with_palette_pressed(self.palette.take())
            .with_nav_steps(nav_steps)
            .with_typed_text(std::mem::take(&mut self.typed_text))
            .with_backspace_count(std::mem::take(&mut self.backspace_count))
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputCollector, code: KeyCode) {
        input.handle_key(PhysicalKey::Code(code), ElementState::Pressed, None);
    }

    fn release(input: &mut InputCollector, code: KeyCode) {
        input.handle_key(PhysicalKey::Code(code), ElementState::Released, None);
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn interact_press_is_edge_triggered_for_single_frame() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyE);

        assert!(input.snapshot_for_frame(true, false).interact_pressed());
        assert!(!input.snapshot_for_frame(true, false).interact_pressed());
    }

    #[test]
    fn held_keys_do_not_spam_edges() {
        let mut input = InputCollector::default();

        press(&mut input, KeyCode::Enter);
        let first = input.snapshot_for_frame(true, false);
        press(&mut input, KeyCode::Enter);
        let second = input.snapshot_for_frame(true, false);
        release(&mut input, KeyCode::Enter);
        press(&mut input, KeyCode::Enter);
        let third = input.snapshot_for_frame(true, false);

        assert!(first.confirm_pressed());
        assert!(!second.confirm_pressed());
        assert!(third.confirm_pressed());
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::ArrowLeft);

        let snapshot = input.snapshot_for_frame(true, false);
        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyD);
        release(&mut input, KeyCode::KeyD);

        assert!(!input
            .snapshot_for_frame(true, false)
            .is_down(InputAction::MoveRight));
    }

    #[test]
    fn palette_chord_requires_control() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyK);
        release(&mut input, KeyCode::KeyK);
        assert!(!input.snapshot_for_frame(true, false).palette_pressed());

        press(&mut input, KeyCode::ControlLeft);
        press(&mut input, KeyCode::KeyK);
        assert!(input.snapshot_for_frame(true, false).palette_pressed());
    }

    #[test]
    fn nav_steps_combine_up_and_down_edges() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::ArrowDown);
        assert_eq!(input.snapshot_for_frame(false, false).nav_steps(), 1);

        press(&mut input, KeyCode::ArrowUp);
        assert_eq!(input.snapshot_for_frame(false, false).nav_steps(), -1);
        assert_eq!(input.snapshot_for_frame(false, false).nav_steps(), 0);
    }

    #[test]
    fn typed_text_skips_control_characters_and_chords() {
        let mut input = InputCollector::default();
        input.handle_key(
            PhysicalKey::Code(KeyCode::KeyA),
            ElementState::Pressed,
            Some("a"),
        );
        input.handle_key(
            PhysicalKey::Code(KeyCode::Enter),
            ElementState::Pressed,
            Some("\r"),
        );
        input.set_control_down(true);
        input.handle_key(
            PhysicalKey::Code(KeyCode::KeyK),
            ElementState::Pressed,
            Some("k"),
        );
        input.set_control_down(false);
        press(&mut input, KeyCode::Backspace);
        press(&mut input, KeyCode::Backspace);

        let snapshot = input.snapshot_for_frame(false, false);
        assert_eq!(snapshot.typed_text(), "a");
        assert_eq!(snapshot.backspace_count(), 2);

        let next = input.snapshot_for_frame(false, false);
        assert_eq!(next.typed_text(), "");
        assert_eq!(next.backspace_count(), 0);
    }

    #[test]
    fn look_delta_accumulates_and_resets() {
        let mut input = InputCollector::default();
        input.add_look_delta(3.0, -1.0);
        input.add_look_delta(2.0, 0.5);

        assert_eq!(input.snapshot_for_frame(true, false).look_delta(), (5.0, -0.5));
        assert_eq!(input.snapshot_for_frame(true, false).look_delta(), (0.0, 0.0));
    }

    #[test]
    fn left_click_is_edge_triggered_and_other_buttons_ignored() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        assert!(!input.snapshot_for_frame(false, false).primary_click_pressed());

        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(input.snapshot_for_frame(false, false).primary_click_pressed());
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(!input.snapshot_for_frame(false, false).primary_click_pressed());
    }

    #[test]
    fn clear_held_releases_movement() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        input.clear_held();

        assert!(!input
            .snapshot_for_frame(true, false)
            .is_down(InputAction::MoveForward));
    }

    #[test]
    fn snapshot_carries_capture_flags() {
        let mut input = InputCollector::default();
        let snapshot = input.snapshot_for_frame(false, true);
        assert!(!snapshot.capture_active());
        assert!(snapshot.capture_denied());
    }

    #[test]
    fn overlay_toggle_is_edge_triggered() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::F3);
        assert!(input.take_overlay_toggle_pressed());
        press(&mut input, KeyCode::F3);
        assert!(!input.take_overlay_toggle_pressed());
    }
}
