use std::collections::HashSet;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ward_engine::{write_text_atomic, SceneKey};

use super::tasks::{Phase, DECISION_COMPLETION_THRESHOLD, FINAL_STEP, TASK_COUNT};
use super::zones::ZoneId;

pub(crate) const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_SUFFIX: &str = ".session.json";
const SESSION_ID_MAX_LEN: usize = 64;

type SaveLoadResult<T> = Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SavedScene {
    Corridor,
    Room,
}

impl From<SceneKey> for SavedScene {
    fn from(key: SceneKey) -> Self {
        match key {
            SceneKey::Corridor => SavedScene::Corridor,
            SceneKey::Room => SavedScene::Room,
        }
    }
}

impl From<SavedScene> for SceneKey {
    fn from(scene: SavedScene) -> Self {
        match scene {
            SavedScene::Corridor => SceneKey::Corridor,
            SavedScene::Room => SceneKey::Room,
        }
    }
}

/// Everything needed to put a session back where it was. Player placement is
/// not stored; the scene's arrival spawn is used instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SessionSnapshot {
    pub(crate) snapshot_version: u32,
    pub(crate) session_id: String,
    pub(crate) scene: SavedScene,
    pub(crate) guidance_step: usize,
    pub(crate) completed_tasks: Vec<usize>,
    pub(crate) completed_zones: Vec<ZoneId>,
    pub(crate) timer_total_seconds: u32,
    pub(crate) timer_remaining_seconds: u32,
    pub(crate) timer_started: bool,
    pub(crate) phase: Phase,
    #[serde(default)]
    pub(crate) recommendation: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum PersistenceError {
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to list sessions directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("rejected snapshot {path}: {message}")]
    Rejected { path: PathBuf, message: String },
}

/// Letters, digits, `-` and `_`; the id doubles as a file stem.
pub(crate) fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= SESSION_ID_MAX_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

pub(crate) fn snapshot_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("{session_id}{SNAPSHOT_SUFFIX}"))
}

pub(crate) fn save_snapshot(
    dir: &Path,
    snapshot: &SessionSnapshot,
) -> Result<PathBuf, PersistenceError> {
    if !is_valid_session_id(&snapshot.session_id) {
        return Err(PersistenceError::InvalidSessionId(
            snapshot.session_id.clone(),
        ));
    }
    let path = snapshot_path(dir, &snapshot.session_id);
    let json = serde_json::to_string_pretty(snapshot).map_err(PersistenceError::Encode)?;
    write_text_atomic(&path, &json).map_err(|source| PersistenceError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// `Ok(None)` when no snapshot exists for the id.
pub(crate) fn load_snapshot(
    dir: &Path,
    session_id: &str,
) -> Result<Option<SessionSnapshot>, PersistenceError> {
    if !is_valid_session_id(session_id) {
        return Err(PersistenceError::InvalidSessionId(session_id.to_string()));
    }
    let path = snapshot_path(dir, session_id);
    match fs::read_to_string(&path) {
        Ok(raw) => read_snapshot(&path, &raw).map(Some),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistenceError::Read { path, source }),
    }
}

/// The most recently modified snapshot in `dir`, if any.
pub(crate) fn latest_snapshot(dir: &Path) -> Result<Option<SessionSnapshot>, PersistenceError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::ListDir {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_snapshot = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SNAPSHOT_SUFFIX));
        if !is_snapshot {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
            continue;
        };
        if newest.as_ref().map_or(true, |(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }

    let Some((_, path)) = newest else {
        return Ok(None);
    };
    let raw = fs::read_to_string(&path).map_err(|source| PersistenceError::Read {
        path: path.clone(),
        source,
    })?;
    read_snapshot(&path, &raw).map(Some)
}

fn read_snapshot(path: &Path, raw: &str) -> Result<SessionSnapshot, PersistenceError> {
    parse_snapshot_json(raw)
        .and_then(|snapshot| validate_snapshot(&snapshot).map(|_| snapshot))
        .map_err(|message| PersistenceError::Rejected {
            path: path.to_path_buf(),
            message,
        })
}

pub(crate) fn parse_snapshot_json(raw: &str) -> SaveLoadResult<SessionSnapshot> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, SessionSnapshot>(&mut deserializer) {
        Ok(snapshot) => Ok(snapshot),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse snapshot json: {source}"))
            } else {
                Err(format!("parse snapshot json at {path}: {source}"))
            }
        }
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> String {
    format!("validation failed at {path}: {}", message.into())
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> String {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

pub(crate) fn validate_snapshot(snapshot: &SessionSnapshot) -> SaveLoadResult<()> {
    if snapshot.snapshot_version != SNAPSHOT_VERSION {
        return Err(expected_actual(
            "snapshot_version",
            SNAPSHOT_VERSION,
            snapshot.snapshot_version,
        ));
    }
    if !is_valid_session_id(&snapshot.session_id) {
        return Err(expected_actual(
            "session_id",
            "1-64 characters of [A-Za-z0-9_-]",
            format!("{:?}", snapshot.session_id),
        ));
    }
    if snapshot.guidance_step > FINAL_STEP {
        return Err(expected_actual(
            "guidance_step",
            format!("at most {FINAL_STEP}"),
            snapshot.guidance_step,
        ));
    }

    let mut seen = HashSet::with_capacity(snapshot.completed_tasks.len());
    for (index, task) in snapshot.completed_tasks.iter().enumerate() {
        let task_path = format!("completed_tasks[{index}]");
        if *task >= TASK_COUNT {
            return Err(expected_actual(
                &task_path,
                format!("at most {FINAL_STEP}"),
                task,
            ));
        }
        if !seen.insert(*task) {
            return Err(validation_err(&task_path, format!("duplicate task {task}")));
        }
    }

    let mut seen_zones = HashSet::with_capacity(snapshot.completed_zones.len());
    for (index, zone) in snapshot.completed_zones.iter().enumerate() {
        if !seen_zones.insert(*zone) {
            return Err(validation_err(
                &format!("completed_zones[{index}]"),
                format!("duplicate zone {}", zone.as_str()),
            ));
        }
    }

    if snapshot.timer_remaining_seconds > snapshot.timer_total_seconds {
        return Err(expected_actual(
            "timer_remaining_seconds",
            format!("at most {}", snapshot.timer_total_seconds),
            snapshot.timer_remaining_seconds,
        ));
    }

    let timer_expired = snapshot.timer_started && snapshot.timer_remaining_seconds == 0;
    let tasks_done = seen.len() >= DECISION_COMPLETION_THRESHOLD
        && snapshot.guidance_step == FINAL_STEP;
    if snapshot.phase == Phase::Decision && !timer_expired && !tasks_done {
        return Err(validation_err(
            "phase",
            "decision phase requires an expired timer or completed tasks at the final step",
        ));
    }

    let submitted = seen.contains(&FINAL_STEP);
    if submitted && snapshot.phase != Phase::Decision {
        return Err(expected_actual(
            "phase",
            "decision when the final task is completed",
            "guided",
        ));
    }
    if submitted != snapshot.recommendation.is_some() {
        return Err(validation_err(
            "recommendation",
            "must be present exactly when the final task is completed",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionSnapshot {
        SessionSnapshot {
            snapshot_version: SNAPSHOT_VERSION,
            session_id: "round-1".to_string(),
            scene: SavedScene::Room,
            guidance_step: 3,
            completed_tasks: vec![0, 2],
            completed_zones: vec![ZoneId::RoomDoor],
            timer_total_seconds: 600,
            timer_remaining_seconds: 512,
            timer_started: true,
            phase: Phase::Guided,
            recommendation: None,
        }
    }

    #[test]
    fn save_then_load_returns_the_same_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = sample();

        let path = save_snapshot(dir.path(), &snapshot).expect("save");
        assert_eq!(path, dir.path().join("round-1.session.json"));

        let loaded = load_snapshot(dir.path(), "round-1")
            .expect("load")
            .expect("present");
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_snapshot(dir.path(), "nobody").expect("load").is_none());
        assert!(latest_snapshot(dir.path()).expect("latest").is_none());
    }

    #[test]
    fn latest_snapshot_ignores_other_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "not a snapshot").expect("write");
        save_snapshot(dir.path(), &sample()).expect("save");

        let latest = latest_snapshot(dir.path())
            .expect("latest")
            .expect("present");
        assert_eq!(latest.session_id, "round-1");
    }

    #[test]
    fn parse_errors_name_the_json_path() {
        let raw = serde_json::to_string(&sample())
            .expect("encode")
            .replace("\"phase\":\"guided\"", "\"phase\":\"paused\"");
        let error = parse_snapshot_json(&raw).expect_err("bad phase");
        assert!(error.contains("at phase"), "{error}");
    }

    #[test]
    fn corrupt_file_is_rejected_with_its_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = snapshot_path(dir.path(), "round-1");
        fs::write(&path, "{ not json").expect("write");

        let error = load_snapshot(dir.path(), "round-1").expect_err("corrupt");
        assert!(matches!(error, PersistenceError::Rejected { .. }));
        assert!(error.to_string().contains("round-1.session.json"));
    }

    #[test]
    fn validation_rejects_out_of_range_progress() {
        let mut snapshot = sample();
        snapshot.guidance_step = 8;
        assert_eq!(
            validate_snapshot(&snapshot),
            Err("validation failed at guidance_step: expected at most 7, got 8".to_string())
        );

        let mut snapshot = sample();
        snapshot.completed_tasks = vec![0, 9];
        assert!(validate_snapshot(&snapshot)
            .expect_err("index")
            .contains("completed_tasks[1]"));

        let mut snapshot = sample();
        snapshot.completed_tasks = vec![0, 0];
        assert!(validate_snapshot(&snapshot)
            .expect_err("duplicate")
            .contains("duplicate task 0"));
    }

    #[test]
    fn validation_rejects_unearned_decision_phase() {
        let mut snapshot = sample();
        snapshot.phase = Phase::Decision;
        assert!(validate_snapshot(&snapshot)
            .expect_err("phase")
            .starts_with("validation failed at phase"));

        snapshot.timer_remaining_seconds = 0;
        assert_eq!(validate_snapshot(&snapshot), Ok(()));
    }

    #[test]
    fn validation_ties_recommendation_to_final_task() {
        let mut snapshot = sample();
        snapshot.phase = Phase::Decision;
        snapshot.timer_remaining_seconds = 0;
        snapshot.completed_tasks = vec![0, 2, 7];
        assert!(validate_snapshot(&snapshot)
            .expect_err("missing text")
            .contains("recommendation"));

        snapshot.recommendation = Some("Fluids and escalate".to_string());
        assert_eq!(validate_snapshot(&snapshot), Ok(()));
    }

    #[test]
    fn session_ids_must_be_file_safe() {
        assert!(is_valid_session_id("ward-round_01"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../escape"));
        assert!(!is_valid_session_id(&"x".repeat(65)));

        let mut snapshot = sample();
        snapshot.session_id = "a/b".to_string();
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            save_snapshot(dir.path(), &snapshot),
            Err(PersistenceError::InvalidSessionId(_))
        ));
    }
}
