//! Persisted launcher record.
//!
//! One JSON file per owner id under the state directory, rewritten whole on
//! every save. Loading merges the stored fields over the defaults, so a
//! record written by an older launcher (or missing a field) still loads.

extern crate alloc;

use alloc::{
    format,
    string::{String, ToString},
};

use serde::{Deserialize, Serialize};

use crate::fs::{self, Filesystem, FsError};

/// Owner id of the launcher's own record, and the `running` value meaning
/// "no app is running".
pub const LAUNCHER: &str = "launcher";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherState {
    pub page: usize,
    pub running: String,
}

impl Default for LauncherState {
    fn default() -> Self {
        Self {
            page: 0,
            running: LAUNCHER.to_string(),
        }
    }
}

impl LauncherState {
    /// Name of the app that was running at power loss, if any.
    pub fn running_app(&self) -> Option<&str> {
        if self.running == LAUNCHER {
            None
        } else {
            Some(self.running.as_str())
        }
    }

    /// Pulls `page` back into `[0, max_page - 1]`. Returns true if it moved.
    pub fn clamp_page(&mut self, max_page: usize) -> bool {
        let last = max_page.saturating_sub(1);
        if self.page > last {
            self.page = last;
            return true;
        }
        false
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("state storage: {0}")]
    Fs(#[from] FsError),
    #[error("state encoding: {0}")]
    Encode(String),
}

pub struct StateStore {
    dir: String,
}

impl StateStore {
    pub fn new(dir: &str) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, id: &str) -> String {
        fs::join(&self.dir, &format!("{}.json", id))
    }

    /// Never fails: a missing or unreadable record yields the defaults,
    /// which are then written back so the next boot finds a valid file.
    pub fn load<F: Filesystem>(&self, fs: &F, id: &str) -> LauncherState {
        let path = self.path(id);
        let parsed = fs::read_to_end(fs, &path)
            .map_err(StateError::from)
            .and_then(|data| {
                serde_json::from_slice::<LauncherState>(&data)
                    .map_err(|err| StateError::Encode(err.to_string()))
            });
        match parsed {
            Ok(state) => {
                log::debug!("Loaded state {}: {:?}", path, state);
                state
            }
            Err(err) => {
                log::warn!("State {} unusable ({}), using defaults", path, err);
                let state = LauncherState::default();
                if let Err(err) = self.save(fs, id, &state) {
                    log::warn!("Could not write default state {}: {}", path, err);
                }
                state
            }
        }
    }

    pub fn save<F: Filesystem>(&self, fs: &F, id: &str, state: &LauncherState) -> Result<(), StateError> {
        let data = serde_json::to_vec(state).map_err(|err| StateError::Encode(err.to_string()))?;
        fs.create_dir_all(&self.dir)
            .map_err(|err| StateError::Fs(FsError::from_io(err)))?;
        fs::write_file(fs, &self.path(id), &data)?;
        log::debug!("Saved state {}: {:?}", id, state);
        Ok(())
    }

    /// Writes `base` with `app` as running and returns the written record.
    /// `base` is left untouched, so a failed write changes nothing.
    pub fn set_running<F: Filesystem>(
        &self,
        fs: &F,
        base: &LauncherState,
        app: &str,
    ) -> Result<LauncherState, StateError> {
        let mut state = base.clone();
        state.running = app.into();
        self.save(fs, LAUNCHER, &state)?;
        Ok(state)
    }

    /// Resets `running` to the launcher. Returns true if an app was running,
    /// i.e. the user just left an app.
    pub fn clear_running<F: Filesystem>(&self, fs: &F) -> bool {
        let mut state = self.load(fs, LAUNCHER);
        if state.running_app().is_none() {
            return false;
        }
        log::info!("Clearing running app {}", state.running);
        state.running = LAUNCHER.into();
        if let Err(err) = self.save(fs, LAUNCHER, &state) {
            log::warn!("Could not persist cleared state: {}", err);
        }
        true
    }
}
