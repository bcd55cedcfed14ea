use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;

use tracing::{debug, info, warn};
use ward_engine::{InputSnapshot, SceneCommand, SceneKey, Tone};

use super::collaborators::{
    DecisionPayload, NoScorer, Overlay, OverlayAction, PaletteCommand, RecommendationScorer,
};
use super::events::{EventDispatcher, SessionEvent};
use super::motion::{MoveKeys, Player};
use super::persistence::{save_snapshot, SessionSnapshot, SNAPSHOT_VERSION};
use super::tasks::{DecisionCause, TaskSequencer, TASK_COUNT};
use super::timer::{SessionTimer, DEFAULT_SESSION_SECONDS};
use super::zones::{detect_active_zone, SceneLayout, ZoneId, ZoneProbe, CORRIDOR, REFUSAL_PROMPT};

pub(crate) const DEFAULT_MOUSE_SENSITIVITY: f32 = 0.0025;
pub(crate) const DEFAULT_SESSION_ID: &str = "ward-round";
const NOTICE_SECONDS: f32 = 3.5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimConfig {
    pub(crate) session_seconds: u32,
    pub(crate) mouse_sensitivity: f32,
    pub(crate) session_id: String,
    pub(crate) resume: bool,
    /// Snapshots are only written when this is set.
    pub(crate) sessions_dir: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            session_seconds: DEFAULT_SESSION_SECONDS,
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            session_id: DEFAULT_SESSION_ID.to_string(),
            resume: false,
            sessions_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Notice {
    pub(crate) text: String,
    pub(crate) tone: Tone,
    remaining_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionOutcome {
    NoZone,
    Refused(ZoneId),
    Performed(ZoneId),
}

/// The one session of the process. Both scenes drive it through `&mut`, so
/// task progress, the timer and open panels survive scene swaps.
pub(crate) struct WardSession {
    config: SimConfig,
    scene: SceneKey,
    placed: bool,
    player: Player,
    sequencer: TaskSequencer,
    timer: SessionTimer,
    completed_zones: BTreeSet<ZoneId>,
    events: EventDispatcher,
    overlay: Option<Overlay>,
    active_zone: Option<ZoneProbe>,
    notice: Option<Notice>,
    capture_active: bool,
    draft: String,
    submission: Option<DecisionPayload>,
    scorer: Box<dyn RecommendationScorer>,
    commands: VecDeque<SceneCommand>,
}

impl WardSession {
    pub(crate) fn new(config: SimConfig) -> Self {
        let spawn = CORRIDOR.start_spawn;
        let timer = SessionTimer::new(config.session_seconds);
        Self {
            config,
            scene: SceneKey::Corridor,
            placed: false,
            player: Player::spawn_at(spawn.x, spawn.z, spawn.yaw),
            sequencer: TaskSequencer::new(),
            timer,
            completed_zones: BTreeSet::new(),
            events: EventDispatcher::default(),
            overlay: None,
            active_zone: None,
            notice: None,
            capture_active: false,
            draft: String::new(),
            submission: None,
            scorer: Box::new(NoScorer),
            commands: VecDeque::new(),
        }
    }

    /// Rebuilds a session from a validated snapshot.
    pub(crate) fn resumed(config: SimConfig, snapshot: &SessionSnapshot) -> Self {
        let mut session = Self::new(config);
        session.config.session_id = snapshot.session_id.clone();
        session.scene = snapshot.scene.into();
        session.placed = true;
        session.sequencer = TaskSequencer::restore(
            snapshot.guidance_step,
            &snapshot.completed_tasks,
            snapshot.phase,
        );
        session.timer = SessionTimer::restore(
            snapshot.timer_total_seconds,
            snapshot.timer_remaining_seconds,
            snapshot.timer_started,
        );
        session.completed_zones = snapshot.completed_zones.iter().copied().collect();
        session.submission = snapshot.recommendation.as_ref().map(|recommendation| {
            DecisionPayload {
                recommendation: recommendation.clone(),
                evaluation: None,
            }
        });
        info!(
            session_id = %snapshot.session_id,
            scene = session.scene.as_str(),
            step = session.sequencer.step(),
            completed = session.sequencer.completed_count(),
            remaining_seconds = session.timer.remaining_seconds(),
            "session_resumed"
        );
        session
    }

    pub(crate) fn with_scorer(mut self, scorer: Box<dyn RecommendationScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub(crate) fn scene(&self) -> SceneKey {
        self.scene
    }

    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn sequencer(&self) -> &TaskSequencer {
        &self.sequencer
    }

    pub(crate) fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub(crate) fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub(crate) fn active_zone(&self) -> Option<ZoneProbe> {
        self.active_zone
    }

    pub(crate) fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub(crate) fn capture_active(&self) -> bool {
        self.capture_active
    }

    pub(crate) fn draft(&self) -> &str {
        &self.draft
    }

    pub(crate) fn submission(&self) -> Option<&DecisionPayload> {
        self.submission.as_ref()
    }

    pub(crate) fn zone_completed(&self, zone: ZoneId) -> bool {
        self.completed_zones.contains(&zone)
    }

    /// One rendered frame: panels, collaborator events, motion, zone probe,
    /// interaction and finally the terminal check.
    pub(crate) fn update_frame(
        &mut self,
        frame_dt_seconds: f32,
        input: &InputSnapshot,
        layout: &'static SceneLayout,
    ) -> SceneCommand {
        self.capture_active = input.capture_active();
        if input.capture_denied() {
            self.show_notice("Pointer capture was refused. Click to try again", Tone::Warning);
        }
        if self.capture_active {
            self.timer.start();
        }

        let overlay_at_start = self.overlay.is_some();
        if overlay_at_start {
            self.handle_overlay_input(input);
        } else {
            self.handle_world_keys(input);
        }
        self.dispatch_events();

        let roaming = self.capture_active
            && !overlay_at_start
            && self.overlay.is_none()
            && !self.sequencer.in_decision_phase();
        if roaming {
            self.player.set_keys(MoveKeys::from_snapshot(input));
            let (dx, dy) = input.look_delta();
            self.player.apply_look(dx, dy, self.config.mouse_sensitivity);
            self.player.integrate(frame_dt_seconds, layout.speed, &layout.boundary);
            debug_assert!(layout.boundary.contains(self.player.x, self.player.z));
        } else {
            self.player.clear_keys();
        }

        self.active_zone = if self.sequencer.in_decision_phase() {
            None
        } else {
            detect_active_zone(self.player.position(), layout.zones, &self.sequencer)
        };

        if roaming && input.interact_pressed() {
            self.trigger_interaction();
        }
        if roaming && input.confirm_pressed() {
            self.sequencer.acknowledge();
        }

        self.settle();
        self.tick_notice(frame_dt_seconds);
        self.next_command()
    }

    /// One elapsed second of session time.
    pub(crate) fn on_interval(&mut self) -> SceneCommand {
        self.timer.tick();
        self.settle();
        self.next_command()
    }

    pub(crate) fn on_scene_loaded(&mut self, layout: &'static SceneLayout) {
        let switched = self.placed;
        let spawn = if switched {
            layout.arrival_spawn
        } else {
            layout.start_spawn
        };
        self.placed = true;
        self.player = Player::spawn_at(spawn.x, spawn.z, spawn.yaw);
        self.scene = layout.key;
        self.active_zone = None;
        if layout.key == SceneKey::Room {
            self.sequencer.on_room_entered();
        }
        info!(
            scene = layout.key.as_str(),
            step = self.sequencer.step(),
            "scene_entered"
        );
        if switched {
            self.save_now("scene_entered");
        }
    }

    #[cfg(test)]
    pub(crate) fn place_player(&mut self, x: f32, z: f32) {
        self.player.x = x;
        self.player.z = z;
    }

    pub(crate) fn on_scene_unloaded(&mut self) {
        self.player.clear_keys();
        self.active_zone = None;
        self.save_now("scene_unload");
    }

    /// Runs the interaction for the zone under the player, if any.
    /// Nothing is performed once the decision phase has begun.
    pub(crate) fn trigger_interaction(&mut self) -> InteractionOutcome {
        if self.sequencer.in_decision_phase() {
            return InteractionOutcome::NoZone;
        }
        let Some(probe) = self.active_zone else {
            return InteractionOutcome::NoZone;
        };
        let zone = probe.zone.id;
        if !probe.permitted {
            info!(
                zone = zone.as_str(),
                gate = probe.zone.gate.map_or("none", |key| key.as_str()),
                step = self.sequencer.step(),
                "interaction_refused"
            );
            self.show_notice(REFUSAL_PROMPT, Tone::Blocked);
            return InteractionOutcome::Refused(zone);
        }

        info!(zone = zone.as_str(), "interaction_performed");
        match zone {
            ZoneId::RoomDoor => {
                self.completed_zones.insert(zone);
                self.sequencer.complete_task(0, "room_door");
                self.request_scene(SceneKey::Room);
            }
            ZoneId::HandoverBoard => {
                self.completed_zones.insert(zone);
                self.open_overlay(Overlay::Handover);
            }
            ZoneId::RoomExit => self.request_scene(SceneKey::Corridor),
            ZoneId::EhrWorkstation => {
                self.completed_zones.insert(zone);
                self.open_overlay(Overlay::RecordViewer { page: 0 });
            }
            ZoneId::PatientBed => {
                self.completed_zones.insert(zone);
                self.open_overlay(Overlay::PatientExam);
            }
            ZoneId::NurseStation => {
                self.completed_zones.insert(zone);
                self.open_overlay(Overlay::NurseConsult);
            }
        }
        InteractionOutcome::Performed(zone)
    }

    pub(crate) fn next_command(&mut self) -> SceneCommand {
        self.commands.pop_front().unwrap_or(SceneCommand::None)
    }

    /// Writes the resume snapshot when a sessions directory is configured.
    pub(crate) fn save_now(&mut self, reason: &'static str) -> bool {
        let Some(dir) = self.config.sessions_dir.clone() else {
            return false;
        };
        match save_snapshot(&dir, &self.snapshot()) {
            Ok(path) => {
                info!(path = %path.display(), reason, "save_written");
                true
            }
            Err(error) => {
                warn!(error = %error, reason, "save_failed");
                self.show_notice("Could not save the session", Tone::Warning);
                false
            }
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            snapshot_version: SNAPSHOT_VERSION,
            session_id: self.config.session_id.clone(),
            scene: self.scene.into(),
            guidance_step: self.sequencer.step(),
            completed_tasks: self.sequencer.completed_indices(),
            completed_zones: self.completed_zones.iter().copied().collect(),
            timer_total_seconds: self.timer.total_seconds(),
            timer_remaining_seconds: self.timer.remaining_seconds(),
            timer_started: self.timer.started(),
            phase: self.sequencer.phase(),
            recommendation: self
                .submission
                .as_ref()
                .map(|payload| payload.recommendation.clone()),
        }
    }

    pub(crate) fn debug_title(&self) -> String {
        format!(
            "Ward Round | {} | step {}/{} | {}",
            self.scene.as_str(),
            self.sequencer.step() + 1,
            TASK_COUNT,
            self.timer.clock_text()
        )
    }

    /// Without capture only a click is honoured, except after the round has
    /// ended, where the menu and palette stay reachable and capture is not.
    fn handle_world_keys(&mut self, input: &InputSnapshot) {
        let ended = self.sequencer.in_decision_phase();
        let chrome_ready = self.capture_active || ended;
        if chrome_ready && input.menu_toggle_pressed() {
            self.open_overlay(Overlay::Menu);
        } else if chrome_ready && input.palette_pressed() {
            self.open_overlay(Overlay::CommandPalette { selected: 0 });
        } else if !self.capture_active && !ended && input.primary_click_pressed() {
            self.commands.push_back(SceneCommand::AcquireCapture);
        } else if input.cancel_pressed() {
            self.release_capture();
        }
    }

    fn handle_overlay_input(&mut self, input: &InputSnapshot) {
        let Some(mut overlay) = self.overlay else {
            return;
        };
        if overlay.allows_chrome() {
            if input.menu_toggle_pressed() {
                self.open_overlay(Overlay::Menu);
                return;
            }
            if input.palette_pressed() {
                self.open_overlay(Overlay::CommandPalette { selected: 0 });
                return;
            }
        }

        let action = overlay.handle_input(input, &mut self.draft);
        self.overlay = Some(overlay);
        match action {
            OverlayAction::Stay => {}
            OverlayAction::Close => self.close_overlay(),
            OverlayAction::Execute(command) => {
                self.close_overlay();
                self.run_palette_command(command);
            }
            OverlayAction::Submit => self.submit_decision(),
        }
    }

    fn run_palette_command(&mut self, command: PaletteCommand) {
        info!(command = command.label(), "palette_command");
        let switches_scene = matches!(
            command,
            PaletteCommand::GoToCorridor | PaletteCommand::GoToRoom
        );
        if switches_scene && self.sequencer.in_decision_phase() {
            info!(command = command.label(), "palette_command_locked");
            self.show_notice("The round is over; the ward is closed", Tone::Blocked);
            return;
        }
        match command {
            PaletteCommand::Resume => {}
            PaletteCommand::GoToCorridor => self.request_scene(SceneKey::Corridor),
            PaletteCommand::GoToRoom => self.request_scene(SceneKey::Room),
            PaletteCommand::SaveSession => {
                if self.save_now("palette") {
                    self.show_notice("Session saved", Tone::Done);
                }
            }
            PaletteCommand::Quit => self.commands.push_back(SceneCommand::Quit),
        }
    }

    fn submit_decision(&mut self) {
        let recommendation = self.draft.trim().to_string();
        if recommendation.is_empty() {
            self.show_notice("Write a recommendation before submitting", Tone::Warning);
            return;
        }

        let evaluation = match self.scorer.score(&recommendation) {
            Ok(evaluation) => evaluation,
            Err(error) => {
                warn!(error = %error, "scoring_failed");
                self.show_notice(
                    "Scoring is unavailable; your recommendation was still recorded",
                    Tone::Warning,
                );
                None
            }
        };
        info!(
            chars = recommendation.chars().count(),
            scored = evaluation.is_some(),
            "decision_collected"
        );
        self.close_overlay();
        self.events.push(SessionEvent::DecisionSubmitted(DecisionPayload {
            recommendation,
            evaluation,
        }));
    }

    fn dispatch_events(&mut self) {
        while let Some(event) = self.events.pop() {
            debug!(
                event = event.name(),
                dispatched_total = self.events.dispatched_total(),
                "session_event"
            );
            match event {
                SessionEvent::RecordReviewed => self.sequencer.on_record_closed(),
                SessionEvent::PatientExamined => self.sequencer.on_patient_examined(),
                SessionEvent::NurseConsulted => self.sequencer.on_nurse_consulted(),
                SessionEvent::DecisionSubmitted(payload) => {
                    if self.sequencer.on_decision_submitted() {
                        self.submission = Some(payload);
                        self.open_overlay(Overlay::Debrief);
                    }
                }
            }
        }
    }

    /// Drains events, applies the terminal transition and keeps the decision
    /// panel up while a recommendation is outstanding.
    fn settle(&mut self) {
        self.dispatch_events();
        if let Some(cause) = self.sequencer.check_terminal(self.timer.expired()) {
            let text = match cause {
                DecisionCause::TimerExpired => "Time is up. Submit your recommendation",
                DecisionCause::TasksComplete => "All tasks done. Submit your recommendation",
            };
            self.show_notice(text, Tone::Accent);
            if self.overlay.is_some_and(|overlay| !overlay.is_chrome()) {
                self.close_overlay();
                self.dispatch_events();
            }
        }
        if self.sequencer.in_decision_phase()
            && !self.sequencer.decision_submitted()
            && self.overlay.is_none()
        {
            self.open_overlay(Overlay::Decision);
        }
    }

    fn open_overlay(&mut self, overlay: Overlay) {
        if let Some(current) = self.overlay.take() {
            self.finish_overlay(current);
        }
        info!(overlay = overlay.name(), "overlay_opened");
        self.overlay = Some(overlay);
        self.release_capture();
    }

    fn close_overlay(&mut self) {
        if let Some(current) = self.overlay.take() {
            self.finish_overlay(current);
        }
    }

    fn finish_overlay(&mut self, overlay: Overlay) {
        info!(overlay = overlay.name(), "overlay_closed");
        if let Some(event) = overlay.close_event() {
            self.events.push(event);
        }
    }

    fn release_capture(&mut self) {
        if self.capture_active {
            self.capture_active = false;
            self.player.clear_keys();
            self.commands.push_back(SceneCommand::ReleaseCapture);
        }
    }

    fn request_scene(&mut self, scene: SceneKey) {
        if self.scene != scene {
            self.commands.push_back(SceneCommand::SwitchTo(scene));
        }
    }

    fn show_notice(&mut self, text: &str, tone: Tone) {
        self.notice = Some(Notice {
            text: text.to_string(),
            tone,
            remaining_seconds: NOTICE_SECONDS,
        });
    }

    fn tick_notice(&mut self, frame_dt_seconds: f32) {
        let expired = match &mut self.notice {
            Some(notice) => {
                notice.remaining_seconds -= frame_dt_seconds;
                notice.remaining_seconds <= 0.0
            }
            None => false,
        };
        if expired {
            self.notice = None;
        }
    }
}
