use super::text::{draw_text, text_width_px, LINE_ADVANCE, TEXT_SCALE};
use crate::app::rendering::{fill_rect, rect_outline};
use crate::app::{CaptureState, LoopMetricsSnapshot, SceneKey};

const OVERLAY_PADDING: i32 = 8 * TEXT_SCALE;
const OVERLAY_INSET: i32 = 4 * TEXT_SCALE;
const OVERLAY_TEXT_COLOR: [u8; 4] = [176, 198, 220, 255];
const OVERLAY_BG_COLOR: [u8; 4] = [10, 12, 16, 255];
const OVERLAY_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];

/// Loop diagnostics shown in the top-right corner while F3 is toggled on.
#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub scene: SceneKey,
    pub capture: CaptureState,
    pub dropped_interval_ms: u64,
}

pub(crate) fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    vec![
        format!("FPS: {:.1}", data.metrics.fps),
        format!("Frame: {:.2} ms", data.metrics.frame_time_ms),
        format!("Intervals/s: {:.1}", data.metrics.ips),
        format!("Scene: {}", data.scene.as_str()),
        format!(
            "Capture: {}",
            match data.capture {
                CaptureState::Locked => "locked",
                CaptureState::Released => "released",
            }
        ),
        format!("Dropped: {} ms", data.dropped_interval_ms),
    ]
}

pub(crate) fn draw_debug_overlay(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    if width == 0 || height == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    let longest = lines.iter().map(|line| text_width_px(line)).max().unwrap_or(0);
    let box_width = longest + OVERLAY_INSET * 2;
    let box_height = lines.len() as i32 * LINE_ADVANCE + OVERLAY_INSET * 2;
    let left = width as i32 - OVERLAY_PADDING - box_width;
    let top = OVERLAY_PADDING;

    fill_rect(frame, width, height, left, top, box_width, box_height, OVERLAY_BG_COLOR);
    rect_outline(frame, width, height, left, top, box_width, box_height, OVERLAY_BORDER_COLOR);

    let mut y = top + OVERLAY_INSET;
    for line in &lines {
        draw_text(frame, width, height, left + OVERLAY_INSET, y, line, OVERLAY_TEXT_COLOR);
        y += LINE_ADVANCE;
    }
}
