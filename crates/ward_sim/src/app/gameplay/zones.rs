use std::f32::consts::PI;

use serde::{Deserialize, Serialize};
use ward_engine::{MapPoint, SceneKey};

use super::motion::Boundary;
use super::tasks::{TaskKey, TaskSequencer};

pub(crate) const REFUSAL_PROMPT: &str = "Complete your current task first";

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ZoneShape {
    Rect {
        min_x: f32,
        max_x: f32,
        min_z: f32,
        max_z: f32,
    },
    Circle {
        x: f32,
        z: f32,
        radius: f32,
    },
}

impl ZoneShape {
    /// Edges count as inside.
    pub(crate) fn contains(&self, x: f32, z: f32) -> bool {
        match *self {
            ZoneShape::Rect {
                min_x,
                max_x,
                min_z,
                max_z,
            } => (min_x..=max_x).contains(&x) && (min_z..=max_z).contains(&z),
            ZoneShape::Circle {
                x: cx,
                z: cz,
                radius,
            } => {
                let (dx, dz) = (x - cx, z - cz);
                dx * dx + dz * dz <= radius * radius
            }
        }
    }

    pub(crate) fn label_anchor(&self) -> MapPoint {
        match *self {
            ZoneShape::Rect {
                min_x,
                max_x,
                min_z,
                max_z,
            } => MapPoint::new((min_x + max_x) * 0.5, (min_z + max_z) * 0.5),
            ZoneShape::Circle { x, z, .. } => MapPoint::new(x, z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ZoneId {
    RoomDoor,
    HandoverBoard,
    RoomExit,
    EhrWorkstation,
    PatientBed,
    NurseStation,
}

impl ZoneId {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ZoneId::RoomDoor => "room-door",
            ZoneId::HandoverBoard => "handover-board",
            ZoneId::RoomExit => "room-exit",
            ZoneId::EhrWorkstation => "ehr-workstation",
            ZoneId::PatientBed => "patient-bed",
            ZoneId::NurseStation => "nurse-station",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InteractionZone {
    pub(crate) id: ZoneId,
    pub(crate) shape: ZoneShape,
    pub(crate) gate: Option<TaskKey>,
    pub(crate) label: &'static str,
    pub(crate) prompt: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Spawn {
    pub(crate) x: f32,
    pub(crate) z: f32,
    pub(crate) yaw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SceneLayout {
    pub(crate) key: SceneKey,
    pub(crate) title: &'static str,
    pub(crate) boundary: Boundary,
    pub(crate) zones: &'static [InteractionZone],
    /// Placement for a fresh session.
    pub(crate) start_spawn: Spawn,
    /// Placement when arriving from the other scene or resuming.
    pub(crate) arrival_spawn: Spawn,
    pub(crate) speed: f32,
    pub(crate) grid_scale: f32,
}

const CORRIDOR_ZONES: [InteractionZone; 2] = [
    InteractionZone {
        id: ZoneId::RoomDoor,
        shape: ZoneShape::Rect {
            min_x: -1.5,
            max_x: 1.5,
            min_z: 20.0,
            max_z: 24.0,
        },
        gate: Some(TaskKey::EnterRoom),
        label: "Room 4",
        prompt: "Press E to enter the patient room",
    },
    InteractionZone {
        id: ZoneId::HandoverBoard,
        shape: ZoneShape::Circle {
            x: -1.6,
            z: 8.0,
            radius: 1.2,
        },
        gate: None,
        label: "Handover",
        prompt: "Press E to read the handover board",
    },
];

const ROOM_ZONES: [InteractionZone; 4] = [
    InteractionZone {
        id: ZoneId::RoomExit,
        shape: ZoneShape::Rect {
            min_x: -1.5,
            max_x: 1.5,
            min_z: -5.0,
            max_z: -3.8,
        },
        gate: None,
        label: "Exit",
        prompt: "Press E to return to the corridor",
    },
    InteractionZone {
        id: ZoneId::EhrWorkstation,
        shape: ZoneShape::Rect {
            min_x: 3.0,
            max_x: 5.0,
            min_z: -5.0,
            max_z: -2.0,
        },
        gate: Some(TaskKey::EhrAccess),
        label: "EHR",
        prompt: "Press E to open the electronic health record",
    },
    InteractionZone {
        id: ZoneId::PatientBed,
        shape: ZoneShape::Circle {
            x: 0.0,
            z: 2.0,
            radius: 1.8,
        },
        gate: Some(TaskKey::PatientExam),
        label: "Patient",
        prompt: "Press E to examine the patient",
    },
    InteractionZone {
        id: ZoneId::NurseStation,
        shape: ZoneShape::Circle {
            x: -3.5,
            z: -1.0,
            radius: 1.3,
        },
        gate: Some(TaskKey::NurseConsult),
        label: "Nurse",
        prompt: "Press E to talk to the nurse",
    },
];

pub(crate) static CORRIDOR: SceneLayout = SceneLayout {
    key: SceneKey::Corridor,
    title: "Corridor",
    boundary: Boundary {
        left: 2.0,
        right: 2.0,
        front: 2.0,
        back: 24.0,
    },
    zones: &CORRIDOR_ZONES,
    start_spawn: Spawn {
        x: 0.0,
        z: 0.0,
        yaw: PI,
    },
    arrival_spawn: Spawn {
        x: 0.0,
        z: 18.5,
        yaw: 0.0,
    },
    speed: 3.5,
    grid_scale: 2.0,
};

pub(crate) static ROOM: SceneLayout = SceneLayout {
    key: SceneKey::Room,
    title: "Patient room",
    boundary: Boundary {
        left: 5.0,
        right: 5.0,
        front: 5.0,
        back: 5.0,
    },
    zones: &ROOM_ZONES,
    start_spawn: Spawn {
        x: 0.0,
        z: -3.2,
        yaw: PI,
    },
    arrival_spawn: Spawn {
        x: 0.0,
        z: -3.2,
        yaw: PI,
    },
    speed: 2.5,
    grid_scale: 1.0,
};

pub(crate) fn layout_for(key: SceneKey) -> &'static SceneLayout {
    match key {
        SceneKey::Corridor => &CORRIDOR,
        SceneKey::Room => &ROOM,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ZoneProbe {
    pub(crate) zone: &'static InteractionZone,
    pub(crate) permitted: bool,
}

impl ZoneProbe {
    pub(crate) fn prompt(&self) -> &'static str {
        if self.permitted {
            self.zone.prompt
        } else {
            REFUSAL_PROMPT
        }
    }
}

/// The first zone in table order that contains the position, with the gate
/// verdict for it.
pub(crate) fn detect_active_zone(
    position: MapPoint,
    zones: &'static [InteractionZone],
    sequencer: &TaskSequencer,
) -> Option<ZoneProbe> {
    zones
        .iter()
        .find(|zone| zone.shape.contains(position.x, position.z))
        .map(|zone| ZoneProbe {
            zone,
            permitted: sequencer.permits(zone.gate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gameplay::tasks::Phase;

    static OVERLAPPING: [InteractionZone; 2] = [
        InteractionZone {
            id: ZoneId::PatientBed,
            shape: ZoneShape::Circle {
                x: 0.0,
                z: 0.0,
                radius: 2.0,
            },
            gate: Some(TaskKey::PatientExam),
            label: "first",
            prompt: "first",
        },
        InteractionZone {
            id: ZoneId::NurseStation,
            shape: ZoneShape::Rect {
                min_x: -1.0,
                max_x: 1.0,
                min_z: -1.0,
                max_z: 1.0,
            },
            gate: None,
            label: "second",
            prompt: "second",
        },
    ];

    #[test]
    fn first_declared_zone_wins_on_overlap() {
        let sequencer = TaskSequencer::new();
        let probe = detect_active_zone(MapPoint::new(0.5, 0.5), &OVERLAPPING, &sequencer)
            .expect("zone");

        assert_eq!(probe.zone.id, ZoneId::PatientBed);
        assert!(!probe.permitted);
        assert_eq!(probe.prompt(), REFUSAL_PROMPT);
    }

    #[test]
    fn no_zone_outside_every_shape() {
        let sequencer = TaskSequencer::new();
        assert!(detect_active_zone(MapPoint::new(0.0, 0.0), CORRIDOR.zones, &sequencer).is_none());
    }

    #[test]
    fn room_door_is_permitted_at_start() {
        let sequencer = TaskSequencer::new();
        let probe = detect_active_zone(MapPoint::new(0.0, 22.0), CORRIDOR.zones, &sequencer)
            .expect("door");
        assert_eq!(probe.zone.id, ZoneId::RoomDoor);
        assert!(probe.permitted);
        assert_eq!(probe.prompt(), "Press E to enter the patient room");
    }

    #[test]
    fn nurse_station_refused_before_its_step() {
        let sequencer = TaskSequencer::restore(3, &[0, 2], Phase::Guided);
        let probe = detect_active_zone(MapPoint::new(-3.5, -1.0), ROOM.zones, &sequencer)
            .expect("nurse");
        assert_eq!(probe.zone.id, ZoneId::NurseStation);
        assert!(!probe.permitted);
    }

    #[test]
    fn shapes_include_their_edges() {
        let rect = ZoneShape::Rect {
            min_x: 0.0,
            max_x: 1.0,
            min_z: 0.0,
            max_z: 1.0,
        };
        assert!(rect.contains(1.0, 0.0));
        assert!(!rect.contains(1.01, 0.0));

        let circle = ZoneShape::Circle {
            x: 0.0,
            z: 0.0,
            radius: 1.0,
        };
        assert!(circle.contains(0.0, 1.0));
        assert!(!circle.contains(0.8, 0.8));
    }

    #[test]
    fn spawns_sit_inside_bounds_and_outside_zones() {
        let sequencer = TaskSequencer::new();
        for layout in [&CORRIDOR, &ROOM] {
            for spawn in [layout.start_spawn, layout.arrival_spawn] {
                assert!(layout.boundary.contains(spawn.x, spawn.z));
                assert!(detect_active_zone(
                    MapPoint::new(spawn.x, spawn.z),
                    layout.zones,
                    &sequencer
                )
                .is_none());
            }
        }
    }
}
