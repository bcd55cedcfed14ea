use std::collections::VecDeque;

use super::collaborators::DecisionPayload;

/// Signals raised by the collaborator panels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionEvent {
    RecordReviewed,
    PatientExamined,
    NurseConsulted,
    DecisionSubmitted(DecisionPayload),
}

impl SessionEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            SessionEvent::RecordReviewed => "record_reviewed",
            SessionEvent::PatientExamined => "patient_examined",
            SessionEvent::NurseConsulted => "nurse_consulted",
            SessionEvent::DecisionSubmitted(_) => "decision_submitted",
        }
    }
}

/// Single FIFO queue between the panels and the session.
#[derive(Debug, Default)]
pub(crate) struct EventDispatcher {
    queue: VecDeque<SessionEvent>,
    dispatched_total: u64,
}

impl EventDispatcher {
    pub(crate) fn push(&mut self, event: SessionEvent) {
        self.queue.push_back(event);
    }

    pub(crate) fn pop(&mut self) -> Option<SessionEvent> {
        let event = self.queue.pop_front()?;
        self.dispatched_total = self.dispatched_total.saturating_add(1);
        Some(event)
    }

    pub(crate) fn dispatched_total(&self) -> u64 {
        self.dispatched_total
    }
}
