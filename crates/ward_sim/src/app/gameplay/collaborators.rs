use thiserror::Error;
use ward_engine::InputSnapshot;

use super::events::SessionEvent;

pub(crate) const DECISION_MAX_CHARS: usize = 600;

pub(crate) struct RecordPage {
    pub(crate) title: &'static str,
    pub(crate) lines: &'static [&'static str],
}

pub(crate) const RECORD_PAGES: [RecordPage; 3] = [
    RecordPage {
        title: "Summary",
        lines: &[
            "78 year old admitted overnight with community acquired pneumonia.",
            "Background: type 2 diabetes, chronic kidney disease stage 3, atrial fibrillation.",
            "Regular medication: metformin, apixaban, bisoprolol.",
        ],
    },
    RecordPage {
        title: "Observations",
        lines: &[
            "Temperature 38.4, heart rate 112 irregular, blood pressure 98/60.",
            "Respiratory rate 24, oxygen saturation 91% on room air.",
            "Urine output 15 ml/h over the last four hours.",
        ],
    },
    RecordPage {
        title: "Investigations",
        lines: &[
            "CRP 212, white cell count 17.8, creatinine 168 (baseline 110).",
            "Lactate 2.9. Chest film: right lower lobe consolidation.",
            "Blood cultures taken at 02:10, results pending.",
        ],
    },
];

pub(crate) const HANDOVER_LINES: [&str; 3] = [
    "Bay 4: new admission overnight, pneumonia on IV antibiotics.",
    "Night team flagged rising creatinine and soft blood pressure.",
    "Please review early on the round.",
];

pub(crate) const EXAM_LINES: [&str; 3] = [
    "Alert but drowsy, warm peripheries, capillary refill 3 seconds.",
    "Coarse crackles right base, reduced air entry.",
    "Dry mucous membranes. Abdomen soft, non tender.",
];

pub(crate) const NURSE_LINES: [&str; 3] = [
    "She has barely drunk anything since midnight.",
    "Her last dose of antibiotics was given at 04:00.",
    "The family are asking whether she will need a high dependency bed.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaletteCommand {
    Resume,
    GoToCorridor,
    GoToRoom,
    SaveSession,
    Quit,
}

impl PaletteCommand {
    pub(crate) const ALL: [PaletteCommand; 5] = [
        PaletteCommand::Resume,
        PaletteCommand::GoToCorridor,
        PaletteCommand::GoToRoom,
        PaletteCommand::SaveSession,
        PaletteCommand::Quit,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            PaletteCommand::Resume => "Resume",
            PaletteCommand::GoToCorridor => "Go to corridor",
            PaletteCommand::GoToRoom => "Go to patient room",
            PaletteCommand::SaveSession => "Save session",
            PaletteCommand::Quit => "Quit",
        }
    }
}

/// The panel currently presented over the scene. While one is open, movement
/// and zone interaction are suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overlay {
    Handover,
    RecordViewer { page: usize },
    PatientExam,
    NurseConsult,
    Menu,
    CommandPalette { selected: usize },
    Decision,
    Debrief,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlayAction {
    Stay,
    Close,
    Execute(PaletteCommand),
    Submit,
}

impl Overlay {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Overlay::Handover => "handover",
            Overlay::RecordViewer { .. } => "record_viewer",
            Overlay::PatientExam => "patient_exam",
            Overlay::NurseConsult => "nurse_consult",
            Overlay::Menu => "menu",
            Overlay::CommandPalette { .. } => "command_palette",
            Overlay::Decision => "decision",
            Overlay::Debrief => "debrief",
        }
    }

    /// The collaborator signal raised when this panel closes.
    pub(crate) fn close_event(self) -> Option<SessionEvent> {
        match self {
            Overlay::RecordViewer { .. } => Some(SessionEvent::RecordReviewed),
            Overlay::PatientExam => Some(SessionEvent::PatientExamined),
            Overlay::NurseConsult => Some(SessionEvent::NurseConsulted),
            _ => None,
        }
    }

    pub(crate) fn is_chrome(self) -> bool {
        matches!(self, Overlay::Menu | Overlay::CommandPalette { .. })
    }

    /// Panels the menu and palette may be opened over.
    pub(crate) fn allows_chrome(self) -> bool {
        matches!(self, Overlay::Decision | Overlay::Debrief)
    }

    pub(crate) fn handle_input(
        &mut self,
        input: &InputSnapshot,
        draft: &mut String,
    ) -> OverlayAction {
        match self {
            Overlay::Handover | Overlay::PatientExam | Overlay::NurseConsult | Overlay::Debrief => {
                if input.cancel_pressed() || input.confirm_pressed() {
                    OverlayAction::Close
                } else {
                    OverlayAction::Stay
                }
            }
            Overlay::RecordViewer { page } => {
                *page = step_clamped(*page, input.nav_steps(), RECORD_PAGES.len());
                if input.cancel_pressed() || input.confirm_pressed() {
                    OverlayAction::Close
                } else {
                    OverlayAction::Stay
                }
            }
            Overlay::Menu => {
                if input.cancel_pressed() || input.menu_toggle_pressed() {
                    OverlayAction::Close
                } else {
                    OverlayAction::Stay
                }
            }
            Overlay::CommandPalette { selected } => {
                *selected = step_wrapped(*selected, input.nav_steps(), PaletteCommand::ALL.len());
                if input.confirm_pressed() {
                    OverlayAction::Execute(PaletteCommand::ALL[*selected])
                } else if input.cancel_pressed() || input.palette_pressed() {
                    OverlayAction::Close
                } else {
                    OverlayAction::Stay
                }
            }
            Overlay::Decision => {
                edit_draft(draft, input.typed_text(), input.backspace_count());
                if input.confirm_pressed() {
                    OverlayAction::Submit
                } else {
                    OverlayAction::Stay
                }
            }
        }
    }
}

fn step_clamped(current: usize, steps: i32, len: usize) -> usize {
    let last = len.saturating_sub(1) as i64;
    (current as i64 + steps as i64).clamp(0, last) as usize
}

fn step_wrapped(current: usize, steps: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as i64 + steps as i64).rem_euclid(len as i64) as usize
}

/// Applies backspaces first, then appends typed text up to the length cap.
pub(crate) fn edit_draft(draft: &mut String, typed: &str, backspaces: u32) {
    for _ in 0..backspaces {
        if draft.pop().is_none() {
            break;
        }
    }
    let room = DECISION_MAX_CHARS.saturating_sub(draft.chars().count());
    draft.extend(typed.chars().take(room));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Evaluation {
    pub(crate) score: u8,
    pub(crate) feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecisionPayload {
    pub(crate) recommendation: String,
    pub(crate) evaluation: Option<Evaluation>,
}

#[derive(Debug, Error)]
pub(crate) enum ScoringError {
    #[error("scoring service unavailable: {0}")]
    Unavailable(String),
}

/// Seam for grading a submitted recommendation. `Ok(None)` means the text
/// was accepted without a grade.
pub(crate) trait RecommendationScorer {
    fn score(&self, recommendation: &str) -> Result<Option<Evaluation>, ScoringError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NoScorer;

impl RecommendationScorer for NoScorer {
    fn score(&self, _recommendation: &str) -> Result<Option<Evaluation>, ScoringError> {
        Ok(None)
    }
}
