use std::env;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ward_engine::{resolve_app_paths, LoopConfig, SceneMachine, StartupError};

use super::gameplay::{
    self, is_valid_session_id, latest_snapshot, load_snapshot, NoScorer, SimConfig, WardSession,
    DEFAULT_MOUSE_SENSITIVITY, DEFAULT_SESSION_ID, DEFAULT_SESSION_SECONDS,
};

const SESSION_SECONDS_ENV_VAR: &str = "WARDSIM_SESSION_SECONDS";
const SESSION_ID_ENV_VAR: &str = "WARDSIM_SESSION_ID";
const MOUSE_SENSITIVITY_ENV_VAR: &str = "WARDSIM_MOUSE_SENSITIVITY";
const RESUME_ENV_VAR: &str = "WARDSIM_RESUME";
const MAX_SESSION_SECONDS: u32 = 4 * 60 * 60;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: WardSession,
    pub(crate) scenes: SceneMachine<WardSession>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Ward Round Startup ===");

    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        sessions_dir = %app_paths.sessions_dir.display(),
        "app_paths_resolved"
    );

    let session_id = resolve_env(SESSION_ID_ENV_VAR, parse_session_id);
    let sim_config = SimConfig {
        session_seconds: resolve_env(SESSION_SECONDS_ENV_VAR, parse_session_seconds)
            .unwrap_or(DEFAULT_SESSION_SECONDS),
        mouse_sensitivity: resolve_env(MOUSE_SENSITIVITY_ENV_VAR, parse_sensitivity)
            .unwrap_or(DEFAULT_MOUSE_SENSITIVITY),
        session_id: session_id
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
        resume: resolve_env(RESUME_ENV_VAR, parse_flag).unwrap_or(false),
        sessions_dir: Some(app_paths.sessions_dir),
    };
    info!(
        session_seconds = sim_config.session_seconds,
        mouse_sensitivity = sim_config.mouse_sensitivity,
        session_id = sim_config.session_id.as_str(),
        resume = sim_config.resume,
        "sim_config"
    );

    let session = open_session(sim_config, session_id.is_some()).with_scorer(Box::new(NoScorer));
    let scenes = gameplay::build_scene_machine(session.scene());

    Ok(AppWiring {
        config: LoopConfig::default(),
        session,
        scenes,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Starts fresh unless resuming was asked for and a usable snapshot exists.
/// Without an explicit session id the newest snapshot is picked up.
fn open_session(config: SimConfig, explicit_id: bool) -> WardSession {
    if !config.resume {
        return WardSession::new(config);
    }
    let Some(dir) = config.sessions_dir.clone() else {
        return WardSession::new(config);
    };

    let loaded = if explicit_id {
        load_snapshot(&dir, &config.session_id)
    } else {
        latest_snapshot(&dir)
    };
    match loaded {
        Ok(Some(snapshot)) => WardSession::resumed(config, &snapshot),
        Ok(None) => {
            info!(dir = %dir.display(), "resume_snapshot_missing");
            WardSession::new(config)
        }
        Err(error) => {
            warn!(error = %error, "resume_snapshot_rejected");
            WardSession::new(config)
        }
    }
}

fn resolve_env<T>(env_var: &'static str, parse: fn(&str) -> Option<T>) -> Option<T> {
    resolve_override(env_var, env::var(env_var), parse)
}

/// `None` when the variable is unset or unusable; unusable values are logged.
fn resolve_override<T>(
    env_var: &'static str,
    raw: Result<String, env::VarError>,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    match raw {
        Ok(value) => {
            let parsed = parse(value.trim());
            if parsed.is_none() {
                warn!(
                    env_var,
                    value = value.as_str(),
                    "invalid env var value; falling back to default"
                );
            }
            parsed
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var,
                error = %err,
                "unable to read env var; falling back to default"
            );
            None
        }
    }
}

fn parse_session_seconds(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|seconds| (1..=MAX_SESSION_SECONDS).contains(seconds))
}

fn parse_sensitivity(raw: &str) -> Option<f32> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0 && *value <= 1.0)
}

fn parse_session_id(raw: &str) -> Option<String> {
    is_valid_session_id(raw).then(|| raw.to_string())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn unset_override_falls_back_silently() {
        let value = resolve_override(
            SESSION_SECONDS_ENV_VAR,
            Err(env::VarError::NotPresent),
            parse_session_seconds,
        );
        assert_eq!(value, None);
    }

    #[test]
    fn valid_override_is_used() {
        let value = resolve_override(
            SESSION_SECONDS_ENV_VAR,
            Ok(" 90 ".to_string()),
            parse_session_seconds,
        );
        assert_eq!(value, Some(90));
    }

    #[test]
    fn unusable_overrides_are_dropped() {
        assert_eq!(
            resolve_override(
                SESSION_SECONDS_ENV_VAR,
                Ok("0".to_string()),
                parse_session_seconds
            ),
            None
        );
        assert_eq!(
            resolve_override(
                MOUSE_SENSITIVITY_ENV_VAR,
                Ok("fast".to_string()),
                parse_sensitivity
            ),
            None
        );
        assert_eq!(
            resolve_override(
                SESSION_ID_ENV_VAR,
                Err(env::VarError::NotUnicode(OsString::from("x"))),
                parse_session_id
            ),
            None
        );
    }

    #[test]
    fn sensitivity_must_be_positive_and_small() {
        assert_eq!(parse_sensitivity("0.004"), Some(0.004));
        assert_eq!(parse_sensitivity("0"), None);
        assert_eq!(parse_sensitivity("-0.1"), None);
        assert_eq!(parse_sensitivity("NaN"), None);
        assert_eq!(parse_sensitivity("3"), None);
    }

    #[test]
    fn session_ids_are_checked() {
        assert_eq!(parse_session_id("bay-4"), Some("bay-4".to_string()));
        assert_eq!(parse_session_id("../bay"), None);
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn resume_without_snapshot_starts_fresh() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SimConfig {
            resume: true,
            sessions_dir: Some(dir.path().to_path_buf()),
            ..SimConfig::default()
        };
        let session = open_session(config, false);
        assert_eq!(session.sequencer().step(), 0);
        assert!(!session.timer().started());
    }

    #[test]
    fn corrupt_snapshot_is_rejected_and_session_starts_fresh() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("bay-4.session.json"), "{\"snapshot_version\": 1")
            .expect("write");
        let config = SimConfig {
            session_id: "bay-4".to_string(),
            resume: true,
            sessions_dir: Some(dir.path().to_path_buf()),
            ..SimConfig::default()
        };
        let session = open_session(config, true);
        assert_eq!(session.sequencer().step(), 0);
        assert_eq!(session.snapshot().session_id, "bay-4");
    }
}
