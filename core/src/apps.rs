extern crate alloc;

use alloc::{format, string::String, vec::Vec};

use crate::config::LauncherConfig;
use crate::fs::{self, DirEntry, Directory, FsError, Filesystem};

/// Icons shown per menu page, one per face button.
pub const SLOTS_PER_PAGE: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppEntry {
    /// File name without extension; also the value persisted as `running`.
    pub name: String,
    /// Display label, underscores shown as spaces.
    pub label: String,
    pub icon_path: String,
    /// Path handed to the app host.
    pub path: String,
}

impl AppEntry {
    pub fn new(name: &str, config: &LauncherConfig) -> Self {
        let icon_name = name.replace('_', "-");
        Self {
            name: name.into(),
            label: name.replace('_', " "),
            icon_path: fs::join(config.icon_dir(), &format!("icon-{}.jpg", icon_name)),
            path: fs::join(&config.app_dir, name),
        }
    }
}

/// Lists the installed apps in name order. A missing app directory is an
/// empty menu, not an error.
pub fn discover<F: Filesystem>(fs: &F, config: &LauncherConfig) -> Result<Vec<AppEntry>, FsError> {
    let dir = match fs.open_directory(&config.app_dir) {
        Ok(dir) => dir,
        Err(err) => {
            let err = FsError::from_io(err);
            if err == FsError::NotFound {
                log::warn!("App directory {} missing, menu is empty", config.app_dir);
                return Ok(Vec::new());
            }
            return Err(err);
        }
    };
    let suffix = format!(".{}", config.app_extension);
    let mut names: Vec<String> = dir
        .list()
        .map_err(FsError::from_io)?
        .iter()
        .filter(|entry| !entry.is_directory())
        .filter_map(|entry| entry.name().strip_suffix(suffix.as_str()).map(String::from))
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    log::info!("Discovered {} apps in {}", names.len(), config.app_dir);
    Ok(names.iter().map(|name| AppEntry::new(name, config)).collect())
}

/// `ceil(count / 3)`; zero apps means zero pages.
pub fn max_page(count: usize) -> usize {
    count.div_ceil(SLOTS_PER_PAGE)
}

/// Highest valid page index for `count` apps.
pub fn last_page(count: usize) -> usize {
    max_page(count).saturating_sub(1)
}

/// Entries shown on `page`, at most three. Out-of-range pages are empty.
pub fn page_slots(apps: &[AppEntry], page: usize) -> &[AppEntry] {
    let start = page.saturating_mul(SLOTS_PER_PAGE).min(apps.len());
    let end = (start + SLOTS_PER_PAGE).min(apps.len());
    &apps[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemFs;
    use proptest::prelude::*;

    fn fs_with(names: &[&str]) -> MemFs {
        let fs = MemFs::new();
        for name in names {
            fs.insert(&format!("/examples/{}", name), b"");
        }
        fs
    }

    #[test]
    fn discover_strips_extension_and_sorts() {
        let fs = fs_with(&["weather.app", "badge.app", "icon-badge.jpg", "qr_gen.app"]);
        let apps = discover(&fs, &LauncherConfig::default()).unwrap();
        let names: Vec<&str> = apps.iter().map(|app| app.name.as_str()).collect();
        assert_eq!(names, ["badge", "qr_gen", "weather"]);
    }

    #[test]
    fn entry_derives_label_icon_and_path() {
        let entry = AppEntry::new("qr_gen", &LauncherConfig::default());
        assert_eq!(entry.label, "qr gen");
        assert_eq!(entry.icon_path, "/examples/icon-qr-gen.jpg");
        assert_eq!(entry.path, "/examples/qr_gen");
    }

    #[test]
    fn missing_directory_is_empty_menu() {
        let fs = MemFs::new();
        let apps = discover(&fs, &LauncherConfig::default()).unwrap();
        assert!(apps.is_empty());
        assert_eq!(max_page(apps.len()), 0);
        assert!(page_slots(&apps, 0).is_empty());
    }

    #[test]
    fn seven_apps_last_page_has_one_icon() {
        let fs = fs_with(&["a.app", "b.app", "c.app", "d.app", "e.app", "f.app", "g.app"]);
        let apps = discover(&fs, &LauncherConfig::default()).unwrap();
        assert_eq!(max_page(apps.len()), 3);
        let slots = page_slots(&apps, 2);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0], apps[6]);
    }

    proptest! {
        #[test]
        fn max_page_is_ceil_of_thirds(count in 0usize..1000) {
            let pages = max_page(count);
            prop_assert!(pages * SLOTS_PER_PAGE >= count);
            prop_assert!(pages == 0 || (pages - 1) * SLOTS_PER_PAGE < count);
        }

        #[test]
        fn pages_cover_every_app_once(count in 0usize..40) {
            let config = LauncherConfig::default();
            let apps: Vec<AppEntry> = (0..count)
                .map(|i| AppEntry::new(&format!("app{:02}", i), &config))
                .collect();
            let shown: usize = (0..max_page(count)).map(|page| page_slots(&apps, page).len()).sum();
            prop_assert_eq!(shown, count);
            prop_assert!(page_slots(&apps, max_page(count)).is_empty());
        }
    }
}
