use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::info;

pub(crate) const TASK_COUNT: usize = 8;
pub(crate) const FINAL_STEP: usize = TASK_COUNT - 1;
pub(crate) const ROOM_ENTRY_STEP: usize = 2;
pub(crate) const DECISION_COMPLETION_THRESHOLD: usize = 6;

/// Names a gated interaction. A key may cover several consecutive tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TaskKey {
    EnterRoom,
    EhrAccess,
    PatientExam,
    NurseConsult,
}

impl TaskKey {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TaskKey::EnterRoom => "enter-room",
            TaskKey::EhrAccess => "ehr-access",
            TaskKey::PatientExam => "patient-exam",
            TaskKey::NurseConsult => "nurse-consult",
        }
    }

    pub(crate) fn indices(self) -> RangeInclusive<usize> {
        match self {
            TaskKey::EnterRoom => 0..=0,
            TaskKey::EhrAccess => 2..=3,
            TaskKey::PatientExam => 4..=4,
            TaskKey::NurseConsult => 5..=5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TaskSpec {
    pub(crate) label: &'static str,
    pub(crate) guidance: &'static str,
    /// Self-paced tasks have no zone; the player acknowledges them directly.
    pub(crate) self_paced: bool,
}

pub(crate) const TASKS: [TaskSpec; TASK_COUNT] = [
    TaskSpec {
        label: "Walk down the corridor to the patient room",
        guidance: "Walk down the corridor and enter the patient room. \
                   The handover board is on your right.",
        self_paced: false,
    },
    TaskSpec {
        label: "Introduce yourself at the bedside",
        guidance: "Introduce yourself to the patient, then press Enter to continue.",
        self_paced: true,
    },
    TaskSpec {
        label: "Open the electronic health record",
        guidance: "Use the workstation by the window to open the electronic health record.",
        self_paced: false,
    },
    TaskSpec {
        label: "Review the record findings",
        guidance: "Open the record again and review the investigations before moving on.",
        self_paced: false,
    },
    TaskSpec {
        label: "Examine the patient",
        guidance: "Go to the bed and examine the patient.",
        self_paced: false,
    },
    TaskSpec {
        label: "Consult the nurse",
        guidance: "Talk to the nurse at the station about overnight observations.",
        self_paced: false,
    },
    TaskSpec {
        label: "Document your assessment",
        guidance: "Document your assessment in your notes, then press Enter to continue.",
        self_paced: true,
    },
    TaskSpec {
        label: "Submit your clinical recommendation",
        guidance: "Write and submit your clinical recommendation.",
        self_paced: false,
    },
];

pub(crate) const DECISION_GUIDANCE: &str =
    "Time to decide. Write your clinical recommendation and press Enter to submit.";
pub(crate) const SUBMITTED_GUIDANCE: &str = "Recommendation submitted. The session is complete.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Phase {
    #[default]
    Guided,
    Decision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecisionCause {
    TimerExpired,
    TasksComplete,
}

impl DecisionCause {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            DecisionCause::TimerExpired => "timer_expired",
            DecisionCause::TasksComplete => "tasks_complete",
        }
    }
}

/// Owns the guidance step, the completed set and the phase. Every mutation
/// of task progress goes through one of its methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskSequencer {
    step: usize,
    completed: [bool; TASK_COUNT],
    phase: Phase,
}

impl Default for TaskSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSequencer {
    pub(crate) fn new() -> Self {
        Self {
            step: 0,
            completed: [false; TASK_COUNT],
            phase: Phase::Guided,
        }
    }

    /// Rebuilds a sequencer from persisted parts. Callers validate ranges
    /// first; out-of-range indices are ignored here.
    pub(crate) fn restore(step: usize, completed: &[usize], phase: Phase) -> Self {
        let mut sequencer = Self::new();
        sequencer.step = step.min(FINAL_STEP);
        for &index in completed {
            if index < TASK_COUNT {
                sequencer.completed[index] = true;
            }
        }
        sequencer.phase = phase;
        sequencer
    }

    pub(crate) fn step(&self) -> usize {
        self.step
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn in_decision_phase(&self) -> bool {
        self.phase == Phase::Decision
    }

    pub(crate) fn is_completed(&self, index: usize) -> bool {
        self.completed.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn completed_count(&self) -> usize {
        self.completed.iter().filter(|done| **done).count()
    }

    pub(crate) fn completed_indices(&self) -> Vec<usize> {
        (0..TASK_COUNT).filter(|index| self.completed[*index]).collect()
    }

    /// The task gate. Ungated zones are always permitted. A gated key is
    /// permitted for the current step, and for earlier tasks it covers that
    /// are already done; never for a task beyond the step.
    pub(crate) fn permits(&self, gate: Option<TaskKey>) -> bool {
        match gate {
            None => true,
            Some(key) => self.permitted(key),
        }
    }

    pub(crate) fn permitted(&self, key: TaskKey) -> bool {
        key.indices()
            .any(|index| index == self.step || (index < self.step && self.completed[index]))
    }

    /// Returns true when the task was not already completed.
    pub(crate) fn complete_task(&mut self, index: usize, cause: &'static str) -> bool {
        let Some(slot) = self.completed.get_mut(index) else {
            return false;
        };
        if *slot {
            return false;
        }
        *slot = true;
        info!(
            task = index,
            step = self.step,
            completed = self.completed_count(),
            cause,
            "task_completed"
        );
        true
    }

    /// Completes the current step's task and moves to the next step.
    pub(crate) fn advance(&mut self, cause: &'static str) {
        self.complete_task(self.step, cause);
        self.set_step((self.step + 1).min(FINAL_STEP), cause);
    }

    fn set_step(&mut self, step: usize, cause: &'static str) {
        if step <= self.step {
            return;
        }
        let from = self.step;
        self.step = step;
        info!(
            from,
            to = step,
            completed = self.completed_count(),
            cause,
            "guidance_advanced"
        );
    }

    /// Entering the room always lands on the record step, whatever path led
    /// there. The decision phase freezes it.
    pub(crate) fn on_room_entered(&mut self) {
        if self.phase == Phase::Guided && self.step < ROOM_ENTRY_STEP {
            self.complete_task(0, "room_entered");
            self.set_step(ROOM_ENTRY_STEP, "room_entered");
        }
    }

    pub(crate) fn on_patient_examined(&mut self) {
        self.complete_task(4, "patient_examined");
        if self.step == 4 {
            self.set_step(5, "patient_examined");
        }
    }

    pub(crate) fn on_nurse_consulted(&mut self) {
        self.complete_task(5, "nurse_consulted");
        if self.step == 5 {
            self.set_step(6, "nurse_consulted");
        }
    }

    pub(crate) fn on_record_closed(&mut self) {
        self.complete_task(2, "record_reviewed");
        if self.step == 3 {
            self.complete_task(3, "record_reviewed");
            self.advance("record_reviewed");
        }
    }

    /// Accepted once, and only in the decision phase.
    pub(crate) fn on_decision_submitted(&mut self) -> bool {
        if self.phase != Phase::Decision || self.completed[FINAL_STEP] {
            return false;
        }
        self.complete_task(FINAL_STEP, "decision_submitted")
    }

    pub(crate) fn decision_submitted(&self) -> bool {
        self.completed[FINAL_STEP]
    }

    /// The current step can be acknowledged with the continue key.
    pub(crate) fn acknowledgeable(&self) -> bool {
        self.phase == Phase::Guided
            && self.step < FINAL_STEP
            && (self.completed[self.step] || TASKS[self.step].self_paced)
    }

    pub(crate) fn acknowledge(&mut self) -> bool {
        if !self.acknowledgeable() {
            return false;
        }
        self.advance("acknowledged");
        true
    }

    pub(crate) fn terminal_condition(&self, timer_expired: bool) -> Option<DecisionCause> {
        if timer_expired {
            Some(DecisionCause::TimerExpired)
        } else if self.completed_count() >= DECISION_COMPLETION_THRESHOLD
            && self.step == FINAL_STEP
        {
            Some(DecisionCause::TasksComplete)
        } else {
            None
        }
    }

    /// Enters the decision phase when the terminal condition holds. Returns
    /// the cause only on the call that performs the transition.
    pub(crate) fn check_terminal(&mut self, timer_expired: bool) -> Option<DecisionCause> {
        if self.phase == Phase::Decision {
            return None;
        }
        let cause = self.terminal_condition(timer_expired)?;
        self.phase = Phase::Decision;
        info!(
            cause = cause.as_str(),
            step = self.step,
            completed = self.completed_count(),
            "decision_phase_entered"
        );
        Some(cause)
    }

    pub(crate) fn guidance(&self) -> &'static str {
        match self.phase {
            Phase::Guided => TASKS[self.step].guidance,
            Phase::Decision if self.decision_submitted() => SUBMITTED_GUIDANCE,
            Phase::Decision => DECISION_GUIDANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_step(step: usize, completed: &[usize]) -> TaskSequencer {
        TaskSequencer::restore(step, completed, Phase::Guided)
    }

    #[test]
    fn complete_task_is_idempotent() {
        let mut sequencer = TaskSequencer::new();
        assert!(sequencer.complete_task(3, "test"));
        assert!(!sequencer.complete_task(3, "test"));
        assert!(!sequencer.complete_task(TASK_COUNT, "test"));
        assert_eq!(sequencer.completed_indices(), vec![3]);
    }

    #[test]
    fn advance_completes_current_and_saturates_at_final_step() {
        let mut sequencer = TaskSequencer::new();
        for _ in 0..20 {
            let before = sequencer.step();
            sequencer.advance("test");
            assert!(sequencer.step() >= before);
            assert!(sequencer.step() <= FINAL_STEP);
        }
        assert_eq!(sequencer.step(), FINAL_STEP);
        assert_eq!(sequencer.completed_count(), TASK_COUNT);
    }

    #[test]
    fn gate_denies_every_task_beyond_the_step() {
        for step in 0..TASK_COUNT {
            let sequencer = at_step(step, &[]);
            for key in [
                TaskKey::EnterRoom,
                TaskKey::EhrAccess,
                TaskKey::PatientExam,
                TaskKey::NurseConsult,
            ] {
                if key.indices().all(|index| index > step) {
                    assert!(!sequencer.permitted(key), "{} at {step}", key.as_str());
                }
            }
        }
    }

    #[test]
    fn gate_matches_current_step_within_key_range() {
        assert!(at_step(2, &[0]).permitted(TaskKey::EhrAccess));
        assert!(at_step(3, &[0, 2]).permitted(TaskKey::EhrAccess));
        assert!(!at_step(2, &[0]).permitted(TaskKey::PatientExam));
        assert!(at_step(0, &[]).permitted(TaskKey::EnterRoom));
        assert!(at_step(4, &[]).permits(None));
    }

    #[test]
    fn gate_permits_revisiting_completed_earlier_tasks_only() {
        let sequencer = at_step(5, &[0, 2, 3, 4]);
        assert!(sequencer.permitted(TaskKey::EnterRoom));
        assert!(sequencer.permitted(TaskKey::EhrAccess));
        assert!(sequencer.permitted(TaskKey::PatientExam));

        let skipped = at_step(5, &[0]);
        assert!(!skipped.permitted(TaskKey::PatientExam));
    }

    #[test]
    fn room_entry_below_record_step_fast_forwards() {
        let mut sequencer = TaskSequencer::new();
        sequencer.on_room_entered();
        assert_eq!(sequencer.step(), ROOM_ENTRY_STEP);
        assert!(sequencer.is_completed(0));
        assert!(!sequencer.is_completed(1));

        let mut later = at_step(4, &[0, 2, 3]);
        later.on_room_entered();
        assert_eq!(later.step(), 4);
    }

    #[test]
    fn record_close_completes_review_only_on_review_step() {
        let mut sequencer = at_step(2, &[0]);
        sequencer.on_record_closed();
        assert!(sequencer.is_completed(2));
        assert_eq!(sequencer.step(), 2);

        let mut review = at_step(3, &[0, 2]);
        review.on_record_closed();
        assert!(review.is_completed(3));
        assert_eq!(review.step(), 4);
    }

    #[test]
    fn exam_and_consult_advance_only_from_their_own_step() {
        let mut sequencer = at_step(4, &[0, 2, 3]);
        sequencer.on_patient_examined();
        assert_eq!(sequencer.step(), 5);
        sequencer.on_nurse_consulted();
        assert_eq!(sequencer.step(), 6);

        let mut early = at_step(2, &[0]);
        early.on_nurse_consulted();
        assert!(early.is_completed(5));
        assert_eq!(early.step(), 2);
    }

    #[test]
    fn acknowledge_requires_completed_or_self_paced_step() {
        let mut sequencer = at_step(2, &[0]);
        assert!(!sequencer.acknowledge());

        sequencer.on_record_closed();
        assert!(sequencer.acknowledge());
        assert_eq!(sequencer.step(), 3);

        let mut documenting = at_step(6, &[0, 2, 3, 4, 5]);
        assert!(documenting.acknowledge());
        assert_eq!(documenting.step(), FINAL_STEP);
        assert!(!documenting.acknowledge());
    }

    #[test]
    fn terminal_on_timer_expiry_is_one_way_and_idempotent() {
        let mut sequencer = at_step(4, &[0, 1, 2]);
        assert_eq!(sequencer.check_terminal(false), None);
        assert_eq!(
            sequencer.check_terminal(true),
            Some(DecisionCause::TimerExpired)
        );
        assert_eq!(sequencer.check_terminal(true), None);
        assert!(sequencer.in_decision_phase());
    }

    #[test]
    fn room_entry_after_expiry_leaves_progress_alone() {
        let mut sequencer = at_step(0, &[]);
        sequencer.check_terminal(true);
        sequencer.on_room_entered();
        assert_eq!(sequencer.step(), 0);
        assert!(!sequencer.is_completed(0));
    }

    #[test]
    fn terminal_on_completed_tasks_needs_final_step() {
        let mut not_yet = at_step(6, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(not_yet.check_terminal(false), None);

        let mut ready = at_step(FINAL_STEP, &[0, 2, 3, 4, 5, 6]);
        assert_eq!(
            ready.check_terminal(false),
            Some(DecisionCause::TasksComplete)
        );
    }

    #[test]
    fn decision_submission_needs_decision_phase_and_happens_once() {
        let mut sequencer = at_step(FINAL_STEP, &[0, 2, 3, 4, 5, 6]);
        assert!(!sequencer.on_decision_submitted());

        sequencer.check_terminal(false);
        assert!(sequencer.on_decision_submitted());
        assert!(!sequencer.on_decision_submitted());
        assert!(sequencer.decision_submitted());
        assert_eq!(sequencer.guidance(), SUBMITTED_GUIDANCE);
    }
}
