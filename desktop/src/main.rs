use std::{
    fs,
    path::{Path, PathBuf},
};

use badge_core::{config::LauncherConfig, display::{HEIGHT, WIDTH}, launcher::LauncherContext};
use serde::Deserialize;

use crate::{
    display::MinifbBadge,
    host::DemoHost,
    sense::{BoardConfig, SimulatedSense, StdDelay},
    storage::DirFs,
};

mod display;
mod host;
mod sense;
mod storage;

/// `launcher.toml` at the badge root. Every table is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    launcher: LauncherConfig,
    board: BoardConfig,
}

fn load_settings(root: &Path) -> Settings {
    let path = root.join("launcher.toml");
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => {
            log::info!("No {}, using defaults", path.display());
            return Settings::default();
        }
    };
    match toml::from_str(&text) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("Ignoring {}: {}", path.display(), err);
            Settings::default()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let root = std::env::var_os("BADGE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("badge"));
    let mut settings = load_settings(&root);
    settings.board.apply_env();
    log::info!("Badge desktop started, root {}", root.display());

    let window = minifb::Window::new(
        "Badge Desktop",
        WIDTH,
        HEIGHT,
        minifb::WindowOptions {
            scale: minifb::Scale::X4,
            ..minifb::WindowOptions::default()
        },
    )
    .unwrap_or_else(|e| {
        panic!("Unable to open window: {}", e);
    });

    let storage = DirFs::new(&root);
    let host = DemoHost::new(storage.clone(), &settings.launcher.app_extension);
    let mut launcher = LauncherContext::new(
        MinifbBadge::new(window),
        storage,
        SimulatedSense::new(settings.board),
        StdDelay,
        host,
        settings.launcher,
    );

    launcher.boot();
    while launcher.badge.is_open() {
        launcher.tick();
    }
}
