use super::text::{draw_text, text_width_px, wrap_text, GLYPH_ADVANCE, LINE_ADVANCE, TEXT_SCALE};
use crate::app::rendering::{fill_rect, rect_outline};
use crate::app::{DrawList, HudLine, Panel};

const HUD_PADDING: i32 = 8 * TEXT_SCALE;
const BOX_INSET: i32 = 4 * TEXT_SCALE;
const HUD_BG_COLOR: [u8; 4] = [8, 10, 14, 255];
const HUD_BORDER_COLOR: [u8; 4] = [70, 84, 104, 255];
const PANEL_TITLE_COLOR: [u8; 4] = [250, 250, 250, 255];
const PANEL_FOOTER_COLOR: [u8; 4] = [150, 164, 184, 255];
const PANEL_MAX_CHARS: usize = 72;

pub(crate) fn draw_hud(frame: &mut [u8], width: u32, height: u32, draw: &DrawList) {
    if width == 0 || height == 0 {
        return;
    }

    if !draw.hud_lines().is_empty() {
        draw_text_box(frame, width, height, HUD_PADDING, HUD_PADDING, draw.hud_lines());
    }

    if let Some(prompt) = draw.prompt() {
        let box_width = text_width_px(&prompt.text) + BOX_INSET * 2;
        let x = (width as i32 - box_width) / 2;
        let y = height as i32 - HUD_PADDING - LINE_ADVANCE - BOX_INSET * 2;
        draw_text_box(frame, width, height, x, y, std::slice::from_ref(prompt));
    }

    if let Some(panel) = draw.panel() {
        draw_panel(frame, width, height, panel);
    }
}

/// Flattens a panel into display rows, wrapping long lines.
pub(crate) fn panel_rows(panel: &Panel, max_chars: usize) -> Vec<HudLine> {
    let mut rows = vec![HudLine {
        text: panel.title.clone(),
        tone: Default::default(),
    }];
    rows.push(HudLine::new("", Default::default()));
    for line in &panel.lines {
        for wrapped in wrap_text(&line.text, max_chars) {
            rows.push(HudLine::new(wrapped, line.tone));
        }
    }
    if let Some(footer) = &panel.footer {
        rows.push(HudLine::new("", Default::default()));
        for wrapped in wrap_text(footer, max_chars) {
            rows.push(HudLine::new(wrapped, Default::default()));
        }
    }
    rows
}

fn draw_panel(frame: &mut [u8], width: u32, height: u32, panel: &Panel) {
    let fit_chars = ((width as i32 - HUD_PADDING * 4) / GLYPH_ADVANCE).max(8) as usize;
    let rows = panel_rows(panel, PANEL_MAX_CHARS.min(fit_chars));
    let footer_start = panel
        .footer
        .as_ref()
        .map(|footer| rows.len() - wrap_text(footer, PANEL_MAX_CHARS.min(fit_chars)).len());

    let longest = rows.iter().map(|row| text_width_px(&row.text)).max().unwrap_or(0);
    let box_width = longest + BOX_INSET * 2;
    let box_height = rows.len() as i32 * LINE_ADVANCE + BOX_INSET * 2;
    let left = (width as i32 - box_width) / 2;
    let top = ((height as i32 - box_height) / 2).max(HUD_PADDING);

    fill_rect(frame, width, height, left, top, box_width, box_height, HUD_BG_COLOR);
    rect_outline(frame, width, height, left, top, box_width, box_height, PANEL_TITLE_COLOR);

    let mut y = top + BOX_INSET;
    for (index, row) in rows.iter().enumerate() {
        let color = if index == 0 {
            PANEL_TITLE_COLOR
        } else if footer_start.is_some_and(|start| index >= start) {
            PANEL_FOOTER_COLOR
        } else {
            crate::app::rendering::tone_color(row.tone)
        };
        draw_text(frame, width, height, left + BOX_INSET, y, &row.text, color);
        y += LINE_ADVANCE;
    }
}

fn draw_text_box(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, lines: &[HudLine]) {
    let longest = lines.iter().map(|line| text_width_px(&line.text)).max().unwrap_or(0);
    let box_width = longest + BOX_INSET * 2;
    let box_height = lines.len() as i32 * LINE_ADVANCE + BOX_INSET * 2;
    fill_rect(frame, width, height, x, y, box_width, box_height, HUD_BG_COLOR);
    rect_outline(frame, width, height, x, y, box_width, box_height, HUD_BORDER_COLOR);

    let mut line_y = y + BOX_INSET;
    for line in lines {
        let color = crate::app::rendering::tone_color(line.tone);
        draw_text(frame, width, height, x + BOX_INSET, line_y, &line.text, color);
        line_y += LINE_ADVANCE;
    }
}
