use thiserror::Error;
use tracing::warn;
use winit::window::{CursorGrabMode, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Released,
    Locked,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("input capture denied by the windowing system: {reason}")]
    Denied { reason: String },
}

/// The windowing seam behind pointer capture, so capture bookkeeping can be
/// exercised without a live window.
pub(crate) trait CursorGrab {
    fn grab_cursor(&self) -> Result<(), CaptureError>;
    fn release_cursor(&self) -> Result<(), CaptureError>;
}

impl CursorGrab for Window {
    fn grab_cursor(&self) -> Result<(), CaptureError> {
        // Locked is unsupported on some platforms (X11, Windows); Confined is
        // the closest substitute there.
        self.set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.set_cursor_grab(CursorGrabMode::Confined))
            .map_err(|error| CaptureError::Denied {
                reason: error.to_string(),
            })?;
        self.set_cursor_visible(false);
        Ok(())
    }

    fn release_cursor(&self) -> Result<(), CaptureError> {
        self.set_cursor_visible(true);
        self.set_cursor_grab(CursorGrabMode::None)
            .map_err(|error| CaptureError::Denied {
                reason: error.to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub(crate) struct PointerCapture {
    state: CaptureState,
    denied_pending: bool,
}

impl PointerCapture {
    pub(crate) fn state(&self) -> CaptureState {
        self.state
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.state == CaptureState::Locked
    }

    /// Returns `Ok(true)` when capture transitioned to locked on this call.
    pub(crate) fn acquire(&mut self, target: &impl CursorGrab) -> Result<bool, CaptureError> {
        if self.is_locked() {
            return Ok(false);
        }

        match target.grab_cursor() {
            Ok(()) => {
                self.state = CaptureState::Locked;
                Ok(true)
            }
            Err(error) => {
                self.denied_pending = true;
                Err(error)
            }
        }
    }

    /// Returns true when capture was held and is now released. A failing
    /// platform release still leaves the bookkeeping released.
    pub(crate) fn release(&mut self, target: &impl CursorGrab) -> bool {
        if !self.is_locked() {
            return false;
        }

        if let Err(error) = target.release_cursor() {
            warn!(error = %error, "capture_release_failed");
        }
        self.state = CaptureState::Released;
        true
    }

    pub(crate) fn take_denied(&mut self) -> bool {
        std::mem::take(&mut self.denied_pending)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Default)]
    struct FakeCursor {
        deny: bool,
        grabs: Cell<u32>,
        releases: Cell<u32>,
    }

    impl CursorGrab for FakeCursor {
        fn grab_cursor(&self) -> Result<(), CaptureError> {
            self.grabs.set(self.grabs.get() + 1);
            if self.deny {
                Err(CaptureError::Denied {
                    reason: "not focused".to_string(),
                })
            } else {
                Ok(())
            }
        }

        fn release_cursor(&self) -> Result<(), CaptureError> {
            self.releases.set(self.releases.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn acquire_locks_once() {
        let cursor = FakeCursor::default();
        let mut capture = PointerCapture::default();

        assert!(capture.acquire(&cursor).expect("first acquire"));
        assert!(!capture.acquire(&cursor).expect("second acquire"));
        assert_eq!(capture.state(), CaptureState::Locked);
        assert_eq!(cursor.grabs.get(), 1);
    }

    #[test]
    fn denied_acquire_stays_released_and_reports_once() {
        let cursor = FakeCursor {
            deny: true,
            ..FakeCursor::default()
        };
        let mut capture = PointerCapture::default();

        assert!(capture.acquire(&cursor).is_err());
        assert_eq!(capture.state(), CaptureState::Released);
        assert!(capture.take_denied());
        assert!(!capture.take_denied());
    }

    #[test]
    fn release_only_reports_transition_when_locked() {
        let cursor = FakeCursor::default();
        let mut capture = PointerCapture::default();

        assert!(!capture.release(&cursor));
        capture.acquire(&cursor).expect("acquire");
        assert!(capture.release(&cursor));
        assert!(!capture.release(&cursor));
        assert_eq!(cursor.releases.get(), 1);
    }
}
