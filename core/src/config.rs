extern crate alloc;

use alloc::string::{String, ToString};

use serde::Deserialize;

pub const DEFAULT_TITLE: &str = "badgerOS";
pub const DEFAULT_APP_DIR: &str = "/examples";
pub const DEFAULT_APP_EXTENSION: &str = "app";
pub const DEFAULT_STATE_DIR: &str = "/state";

/// Lipo full/empty pair. 2xAA alkaline cells sit closer to 3.2 / 2.4.
pub const DEFAULT_FULL_BATTERY: f32 = 4.2;
pub const DEFAULT_EMPTY_BATTERY: f32 = 2.8;

/// Launcher settings. Every field falls back to the device default when
/// absent, so a partial config file is valid.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub title: String,
    pub app_dir: String,
    /// Directory holding `icon-<name>.jpg`. `None` means the app directory.
    pub icon_dir: Option<String>,
    pub app_extension: String,
    pub state_dir: String,
    pub battery: BatteryThresholds,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatteryThresholds {
    pub full: f32,
    pub empty: f32,
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self {
            full: DEFAULT_FULL_BATTERY,
            empty: DEFAULT_EMPTY_BATTERY,
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            app_dir: DEFAULT_APP_DIR.to_string(),
            icon_dir: None,
            app_extension: DEFAULT_APP_EXTENSION.to_string(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
            battery: BatteryThresholds::default(),
        }
    }
}

impl LauncherConfig {
    pub fn icon_dir(&self) -> &str {
        self.icon_dir.as_deref().unwrap_or(&self.app_dir)
    }
}
