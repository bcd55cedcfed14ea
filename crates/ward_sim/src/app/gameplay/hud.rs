use ward_engine::{DrawList, DrawShape, HudLine, MapPoint, Panel, Tone};

use super::collaborators::{
    Overlay, PaletteCommand, DECISION_MAX_CHARS, EXAM_LINES, HANDOVER_LINES, NURSE_LINES,
    RECORD_PAGES,
};
use super::session::WardSession;
use super::tasks::{TASKS, TASK_COUNT};
use super::zones::{InteractionZone, SceneLayout, ZoneShape};

const CONTROLS_LINES: [&str; 5] = [
    "WASD or arrows: move    Mouse: look",
    "E: interact    Enter: continue",
    "Tab: menu    Ctrl+K: commands",
    "Esc: release the pointer",
    "F3: loop stats",
];

/// Fills the draw list for the active scene: map, zones, player and HUD.
pub(crate) fn render_session(session: &WardSession, layout: &SceneLayout, draw: &mut DrawList) {
    draw.set_bounds(layout.boundary.min_corner(), layout.boundary.max_corner());
    draw.set_grid_spacing(layout.grid_scale);

    for zone in layout.zones {
        let tone = zone_tone(session, zone);
        draw.push_shape(zone_shape(zone, tone));
        draw.push_shape(DrawShape::Label {
            position: zone.shape.label_anchor(),
            text: zone.label.to_string(),
            tone,
        });
    }

    let player = session.player();
    draw.push_shape(DrawShape::Marker {
        position: player.position(),
        heading: player.heading(),
        tone: Tone::Accent,
    });

    push_hud_lines(session, layout, draw);

    match session.overlay() {
        Some(overlay) => draw.set_panel(overlay_panel(session, overlay)),
        None => {
            if session.sequencer().in_decision_phase() {
                draw.set_prompt("Round complete. Tab: review, Ctrl+K: commands", Tone::Done);
            } else if let Some(probe) = session.active_zone() {
                let tone = if probe.permitted {
                    Tone::Active
                } else {
                    Tone::Blocked
                };
                draw.set_prompt(probe.prompt(), tone);
            } else if !session.capture_active() {
                draw.set_prompt("Click to start", Tone::Warning);
            }
        }
    }
}

fn push_hud_lines(session: &WardSession, layout: &SceneLayout, draw: &mut DrawList) {
    let sequencer = session.sequencer();
    let timer = session.timer();
    let clock_tone = if timer.expired() {
        Tone::Blocked
    } else if timer.remaining_seconds() <= 60 {
        Tone::Warning
    } else {
        Tone::Neutral
    };
    draw.push_hud_line(
        format!("{}    {}", layout.title, timer.clock_text()),
        clock_tone,
    );
    draw.push_hud_line(sequencer.guidance(), Tone::Accent);
    draw.push_hud_line(
        format!(
            "Step {}/{}    Tasks done {}/{}",
            sequencer.step() + 1,
            TASK_COUNT,
            sequencer.completed_count(),
            TASK_COUNT
        ),
        Tone::Muted,
    );
    if sequencer.acknowledgeable() && session.overlay().is_none() {
        draw.push_hud_line("Press Enter to continue", Tone::Active);
    }
    if let Some(notice) = session.notice() {
        draw.push_hud_line(notice.text.clone(), notice.tone);
    }
}

fn zone_tone(session: &WardSession, zone: &InteractionZone) -> Tone {
    let active = session
        .active_zone()
        .filter(|probe| probe.zone.id == zone.id);
    match active {
        Some(probe) if probe.permitted => Tone::Active,
        Some(_) => Tone::Blocked,
        None if session.zone_completed(zone.id) => Tone::Done,
        None if !session.sequencer().permits(zone.gate) => Tone::Muted,
        None => Tone::Neutral,
    }
}

fn zone_shape(zone: &InteractionZone, tone: Tone) -> DrawShape {
    match zone.shape {
        ZoneShape::Rect {
            min_x,
            max_x,
            min_z,
            max_z,
        } => DrawShape::Rect {
            min: MapPoint::new(min_x, min_z),
            max: MapPoint::new(max_x, max_z),
            tone,
        },
        ZoneShape::Circle { x, z, radius } => DrawShape::Circle {
            center: MapPoint::new(x, z),
            radius,
            tone,
        },
    }
}

fn plain_lines(lines: &[&str]) -> Vec<HudLine> {
    lines
        .iter()
        .map(|line| HudLine::new(*line, Tone::Neutral))
        .collect()
}

pub(crate) fn overlay_panel(session: &WardSession, overlay: Overlay) -> Panel {
    match overlay {
        Overlay::Handover => Panel {
            title: "Handover board".to_string(),
            lines: plain_lines(&HANDOVER_LINES),
            footer: Some("Enter or Esc to close".to_string()),
        },
        Overlay::RecordViewer { page } => {
            let index = page.min(RECORD_PAGES.len() - 1);
            let record = &RECORD_PAGES[index];
            Panel {
                title: format!(
                    "Health record: {} ({}/{})",
                    record.title,
                    index + 1,
                    RECORD_PAGES.len()
                ),
                lines: plain_lines(record.lines),
                footer: Some("Up/Down to turn pages, Enter or Esc to close".to_string()),
            }
        }
        Overlay::PatientExam => Panel {
            title: "Examination".to_string(),
            lines: plain_lines(&EXAM_LINES),
            footer: Some("Enter or Esc to finish".to_string()),
        },
        Overlay::NurseConsult => Panel {
            title: "Nurse".to_string(),
            lines: plain_lines(&NURSE_LINES),
            footer: Some("Enter or Esc to end the conversation".to_string()),
        },
        Overlay::Menu => menu_panel(session),
        Overlay::CommandPalette { selected } => Panel {
            title: "Commands".to_string(),
            lines: PaletteCommand::ALL
                .iter()
                .enumerate()
                .map(|(index, command)| {
                    if index == selected {
                        HudLine::new(format!("> {}", command.label()), Tone::Active)
                    } else {
                        HudLine::new(format!("  {}", command.label()), Tone::Neutral)
                    }
                })
                .collect(),
            footer: Some("Up/Down to choose, Enter to run, Esc to close".to_string()),
        },
        Overlay::Decision => Panel {
            title: "Clinical recommendation".to_string(),
            lines: vec![
                HudLine::new(session.sequencer().guidance(), Tone::Accent),
                HudLine::new(format!("{}_", session.draft()), Tone::Neutral),
                HudLine::new(
                    format!(
                        "{}/{} characters",
                        session.draft().chars().count(),
                        DECISION_MAX_CHARS
                    ),
                    Tone::Muted,
                ),
            ],
            footer: Some("Type your plan, Enter to submit".to_string()),
        },
        Overlay::Debrief => debrief_panel(session),
    }
}

fn menu_panel(session: &WardSession) -> Panel {
    let sequencer = session.sequencer();
    let mut lines = plain_lines(&CONTROLS_LINES);
    lines.push(HudLine::new("", Tone::Neutral));
    for (index, task) in TASKS.iter().enumerate() {
        let (mark, tone) = if sequencer.is_completed(index) {
            ("[x]", Tone::Done)
        } else if index == sequencer.step() {
            ("[>]", Tone::Active)
        } else {
            ("[ ]", Tone::Muted)
        };
        lines.push(HudLine::new(format!("{mark} {}", task.label), tone));
    }
    Panel {
        title: "Paused".to_string(),
        lines,
        footer: Some("Tab or Esc to resume".to_string()),
    }
}

fn debrief_panel(session: &WardSession) -> Panel {
    let mut lines = vec![HudLine::new("Recommendation recorded.", Tone::Done)];
    if let Some(payload) = session.submission() {
        lines.push(HudLine::new(payload.recommendation.clone(), Tone::Neutral));
        match &payload.evaluation {
            Some(evaluation) => {
                lines.push(HudLine::new(
                    format!("Score: {}/100", evaluation.score),
                    Tone::Accent,
                ));
                lines.push(HudLine::new(evaluation.feedback.clone(), Tone::Neutral));
            }
            None => lines.push(HudLine::new("No automated score available.", Tone::Muted)),
        }
    }
    lines.push(HudLine::new(
        format!(
            "Tasks completed: {}/{}",
            session.sequencer().completed_count(),
            TASK_COUNT
        ),
        Tone::Muted,
    ));
    Panel {
        title: "Debrief".to_string(),
        lines,
        footer: Some("Enter to close".to_string()),
    }
}
