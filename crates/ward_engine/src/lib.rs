use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod atomic_io;

pub use app::{
    run_app, AppError, CaptureError, CaptureState, DrawList, DrawShape, HudLine, InputAction,
    InputSnapshot, LoopConfig, MapPoint, Panel, Scene, SceneCommand, SceneKey, SceneMachine, Tone,
};
pub use atomic_io::{write_bytes_atomic, write_text_atomic};

pub const ROOT_ENV_VAR: &str = "WARDSIM_ROOT";
const SESSIONS_DIR_NAME: &str = "sessions";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub sessions_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create sessions directory at {path}: {source}")]
    CreateSessionsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "WARDSIM_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or sessions/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or sessions/.\n\
Set {env_var} explicitly, for example:\n\
PowerShell: $env:{env_var}=\"C:\\path\\to\\ward-sim\"\n\
Bash/zsh: export {env_var}=\"/path/to/ward-sim\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_for_root(root)
}

/// Derives the sessions directory under `root` and makes sure it exists.
pub fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let sessions_dir = root.join(SESSIONS_DIR_NAME);
    fs::create_dir_all(&sessions_dir).map_err(|source| StartupError::CreateSessionsDir {
        path: sessions_dir.clone(),
        source,
    })?;

    Ok(AppPaths { root, sessions_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_sessions = path.join(SESSIONS_DIR_NAME).is_dir();

    cargo_toml && (has_crates || has_sessions)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
