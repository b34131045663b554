//! In-memory stand-ins for the badge hardware and storage.

use alloc::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::cell::RefCell;

use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType, Read, Write};

use crate::{
    apps::AppEntry,
    display::{Display, PowerLatch, RefreshSpeed},
    error::AppError,
    framebuffer::FrameBuffer,
    fs::{DirEntry, Directory, File, Filesystem, FsStats, Mode},
    icons::{ICON_SIZE, IconSource, ImageData, ImageError},
    input::{Button, ButtonState, Keypad},
    launcher::AppHost,
    power::{HardwareVariant, Pin, PinMode, Pull, SenseHardware},
    state::LauncherState,
};

#[derive(Default)]
struct MemInner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    fail_writes: bool,
    fail_listing: bool,
    stats: Option<FsStats>,
    writes: usize,
}

/// Flat path-keyed filesystem. Parent directories spring into existence
/// when a file is written below them.
pub struct MemFs {
    inner: RefCell<MemInner>,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/".into() } else { trimmed.into() }
}

fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".into(),
        Some(index) => path[..index].into(),
    }
}

impl MemFs {
    pub fn new() -> Self {
        let inner = MemInner {
            stats: Some(FsStats {
                total_blocks: 100,
                free_blocks: 50,
            }),
            ..Default::default()
        };
        Self {
            inner: RefCell::new(inner),
        }
    }

    pub fn insert(&self, path: &str, data: &[u8]) {
        let path = normalize(path);
        self.add_dirs(&parent(&path));
        self.inner.borrow_mut().files.insert(path, data.to_vec());
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.borrow().files.get(&normalize(path)).cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Directory opens fail with a non-`NotFound` error.
    pub fn fail_listing(&self, fail: bool) {
        self.inner.borrow_mut().fail_listing = fail;
    }

    pub fn set_stats(&self, stats: Option<FsStats>) {
        self.inner.borrow_mut().stats = stats;
    }

    /// Number of files opened for writing so far.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    /// The launcher record as currently stored, without the default write-back.
    pub fn load_state(&self) -> LauncherState {
        self.contents("/state/launcher.json")
            .and_then(|data| serde_json::from_slice(&data).ok())
            .unwrap_or_default()
    }

    fn add_dirs(&self, dir: &str) {
        let mut inner = self.inner.borrow_mut();
        let mut current = normalize(dir);
        loop {
            let done = current == "/";
            inner.dirs.insert(current.clone());
            if done {
                break;
            }
            current = parent(&current);
        }
    }
}

impl ErrorType for MemFs {
    type Error = ErrorKind;
}

pub struct MemFile<'a> {
    fs: &'a MemFs,
    path: String,
    pos: usize,
}

impl ErrorType for MemFile<'_> {
    type Error = ErrorKind;
}

impl Read for MemFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let inner = self.fs.inner.borrow();
        let data = inner.files.get(&self.path).ok_or(ErrorKind::NotFound)?;
        let remaining = data.len().saturating_sub(self.pos);
        let count = remaining.min(buf.len());
        buf[..count].copy_from_slice(&data[self.pos..self.pos + count]);
        self.pos += count;
        Ok(count)
    }
}

impl Write for MemFile<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut inner = self.fs.inner.borrow_mut();
        if inner.fail_writes {
            return Err(ErrorKind::Other);
        }
        inner.files.entry(self.path.clone()).or_default().extend_from_slice(buf);
        self.pos += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl File for MemFile<'_> {
    fn size(&self) -> usize {
        self.fs.inner.borrow().files.get(&self.path).map_or(0, Vec::len)
    }
}

#[derive(Clone, Debug)]
pub struct MemEntry {
    name: String,
    is_directory: bool,
    size: usize,
}

impl DirEntry for MemEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_directory
    }

    fn size(&self) -> usize {
        self.size
    }
}

pub struct MemDir {
    entries: Vec<MemEntry>,
}

impl ErrorType for MemDir {
    type Error = ErrorKind;
}

impl Directory for MemDir {
    type Entry = MemEntry;

    fn list(&self) -> Result<Vec<MemEntry>, ErrorKind> {
        Ok(self.entries.clone())
    }
}

impl Filesystem for MemFs {
    type File<'a> = MemFile<'a>;
    type Directory<'a> = MemDir;

    fn open_file(&self, path: &str, mode: Mode) -> Result<MemFile<'_>, ErrorKind> {
        let path = normalize(path);
        match mode {
            Mode::Read => {
                if !self.inner.borrow().files.contains_key(&path) {
                    return Err(ErrorKind::NotFound);
                }
            }
            Mode::Write => {
                if self.inner.borrow().fail_writes {
                    return Err(ErrorKind::PermissionDenied);
                }
                self.add_dirs(&parent(&path));
                let mut inner = self.inner.borrow_mut();
                inner.files.insert(path.clone(), Vec::new());
                inner.writes += 1;
            }
        }
        Ok(MemFile {
            fs: self,
            path,
            pos: 0,
        })
    }

    fn open_directory(&self, path: &str) -> Result<MemDir, ErrorKind> {
        let dir = normalize(path);
        let inner = self.inner.borrow();
        if inner.fail_listing {
            return Err(ErrorKind::Other);
        }
        if !inner.dirs.contains(&dir) {
            return Err(ErrorKind::NotFound);
        }
        let mut entries: Vec<MemEntry> = inner
            .files
            .iter()
            .filter(|(file, _)| parent(file) == dir)
            .map(|(file, data)| MemEntry {
                name: file[file.rfind('/').map_or(0, |i| i + 1)..].to_string(),
                is_directory: false,
                size: data.len(),
            })
            .collect();
        entries.extend(
            inner
                .dirs
                .iter()
                .filter(|sub| sub.as_str() != "/" && parent(sub) == dir)
                .map(|sub| MemEntry {
                    name: sub[sub.rfind('/').map_or(0, |i| i + 1)..].to_string(),
                    is_directory: true,
                    size: 0,
                }),
        );
        Ok(MemDir { entries })
    }

    fn create_dir_all(&self, path: &str) -> Result<(), ErrorKind> {
        if self.inner.borrow().fail_writes {
            return Err(ErrorKind::PermissionDenied);
        }
        self.add_dirs(path);
        Ok(())
    }

    fn stat(&self) -> Result<FsStats, ErrorKind> {
        self.inner.borrow().stats.ok_or(ErrorKind::Unsupported)
    }
}

/// Icons are stored raw: exactly `ICON_SIZE * ICON_SIZE` gray bytes.
impl IconSource for MemFs {
    fn load_icon(&mut self, path: &str) -> Result<ImageData, ImageError> {
        let data = self.contents(path).ok_or(ImageError::NotFound)?;
        if data.len() != (ICON_SIZE * ICON_SIZE) as usize {
            return Err(ImageError::Decode);
        }
        Ok(ImageData {
            width: ICON_SIZE,
            height: ICON_SIZE,
            pixels: data,
        })
    }
}

#[derive(Default)]
pub struct MockIcons {
    pub requested: Vec<String>,
    pub missing: bool,
}

impl IconSource for MockIcons {
    fn load_icon(&mut self, path: &str) -> Result<ImageData, ImageError> {
        self.requested.push(path.into());
        if self.missing {
            return Err(ImageError::NotFound);
        }
        Ok(ImageData {
            width: ICON_SIZE,
            height: ICON_SIZE,
            pixels: vec![0; (ICON_SIZE * ICON_SIZE) as usize],
        })
    }
}

#[derive(Debug)]
pub struct MockFault;

/// Sense pins and ADC. `fail_at_call` counts pin reconfigurations, digital
/// reads and ADC reads from zero and fails exactly that call.
pub struct MockSense {
    variant: HardwareVariant,
    pub radio_active: bool,
    pub radio_active_during_adc: Option<bool>,
    pub radio_toggles: usize,
    pub fail_at_call: Option<usize>,
    pub failed: bool,
    /// Returned once the queue is drained.
    pub repeat_sample: Option<u16>,
    samples: VecDeque<u16>,
    digital: Vec<(Pin, bool)>,
    modes: Vec<(Pin, PinMode, Pull)>,
    calls: usize,
}

impl MockSense {
    pub fn new(variant: HardwareVariant) -> Self {
        Self {
            variant,
            radio_active: false,
            radio_active_during_adc: None,
            radio_toggles: 0,
            fail_at_call: None,
            failed: false,
            repeat_sample: None,
            samples: VecDeque::new(),
            digital: Vec::new(),
            modes: Vec::new(),
            calls: 0,
        }
    }

    pub fn queue_samples(&mut self, samples: &[u16]) {
        self.samples.extend(samples.iter().copied());
    }

    pub fn set_digital(&mut self, pin: Pin, high: bool) {
        self.digital.retain(|(p, _)| *p != pin);
        self.digital.push((pin, high));
    }

    pub fn mode_of(&self, pin: Pin) -> Option<(PinMode, Pull)> {
        self.modes
            .iter()
            .rev()
            .find(|(p, _, _)| *p == pin)
            .map(|(_, mode, pull)| (*mode, *pull))
    }

    fn call(&mut self) -> Result<(), MockFault> {
        let index = self.calls;
        self.calls += 1;
        if self.fail_at_call == Some(index) {
            self.failed = true;
            return Err(MockFault);
        }
        Ok(())
    }
}

impl SenseHardware for MockSense {
    type Error = MockFault;

    fn variant(&self) -> HardwareVariant {
        self.variant
    }

    fn read_raw_adc(&mut self) -> Result<u16, MockFault> {
        self.call()?;
        self.radio_active_during_adc = Some(self.radio_active);
        self.samples.pop_front().or(self.repeat_sample).ok_or(MockFault)
    }

    fn read_digital(&mut self, pin: Pin) -> Result<bool, MockFault> {
        self.call()?;
        Ok(self
            .digital
            .iter()
            .find(|(p, _)| *p == pin)
            .is_some_and(|(_, high)| *high))
    }

    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode, pull: Pull) -> Result<(), MockFault> {
        self.call()?;
        self.modes.push((pin, mode, pull));
        Ok(())
    }

    fn radio_set_active(&mut self, active: bool) -> bool {
        let was = self.radio_active;
        self.radio_active = active;
        self.radio_toggles += 1;
        was
    }
}

/// Delay that only adds up the time it was asked to wait.
#[derive(Default)]
pub struct RecordingDelay {
    total_ns: u64,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Panel, buttons and power latch. Polls replay the queued masks, then
/// report all buttons up.
#[derive(Default)]
pub struct MockBadge {
    pub refreshes: Vec<RefreshSpeed>,
    pub boot_held: u8,
    pub boot_reset: bool,
    pub woken: bool,
    pub keepalives: usize,
    pub halts: usize,
    polls: VecDeque<u8>,
    buttons: ButtonState,
}

impl MockBadge {
    pub fn press(&mut self, button: Button) {
        self.press_all(button.mask());
    }

    pub fn press_all(&mut self, mask: u8) {
        self.polls.push_back(mask);
    }

    pub fn hold_for_polls(&mut self, mask: u8, polls: usize) {
        self.polls.extend(core::iter::repeat_n(mask, polls));
    }

    pub fn is_down_now(&self) -> bool {
        self.buttons.any_down()
    }
}

impl Display for MockBadge {
    fn refresh(&mut self, _frame: &FrameBuffer, speed: RefreshSpeed) {
        self.refreshes.push(speed);
    }
}

impl PowerLatch for MockBadge {
    fn keepalive(&mut self) {
        self.keepalives += 1;
    }

    /// The next wake is a fresh boot, so no edge survives it.
    fn halt(&mut self) {
        self.halts += 1;
        self.buttons = ButtonState::new();
    }
}

impl Keypad for MockBadge {
    fn poll(&mut self) -> ButtonState {
        let mask = self.polls.pop_front().unwrap_or(0);
        self.buttons.update(mask);
        self.buttons
    }

    fn held_at_boot(&self, button: Button) -> bool {
        self.boot_held & button.mask() != 0
    }

    fn reset_held_at_boot(&mut self) {
        self.boot_held = 0;
        self.boot_reset = true;
    }

    fn woken_by_button(&self) -> bool {
        self.woken
    }
}

pub struct MockHost {
    pub launched: Vec<String>,
    pub refreshes_at_launch: Vec<usize>,
    pub buttons_down_at_launch: Vec<bool>,
    pub result: Result<(), AppError>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            launched: Vec::new(),
            refreshes_at_launch: Vec::new(),
            buttons_down_at_launch: Vec::new(),
            result: Ok(()),
        }
    }
}

impl AppHost<MockBadge> for MockHost {
    fn run(&mut self, app: &AppEntry, badge: &mut MockBadge) -> Result<(), AppError> {
        self.launched.push(app.name.clone());
        self.refreshes_at_launch.push(badge.refreshes.len());
        self.buttons_down_at_launch.push(badge.is_down_now());
        self.result.clone()
    }
}
