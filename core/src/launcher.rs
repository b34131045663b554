//! Boot, menu loop and app handoff.
//!
//! [`LauncherContext`] owns every collaborator and the launcher's own
//! state; the boot path and each loop iteration borrow what they need from
//! it. Nothing here keeps module-level state.

extern crate alloc;

use alloc::{string::ToString, vec::Vec};

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_hal::delay::DelayNs;

use crate::{
    apps::{self, AppEntry, SLOTS_PER_PAGE},
    config::LauncherConfig,
    disk,
    display::{Display, PowerLatch, RefreshSpeed},
    error::{AppError, LauncherError},
    framebuffer::FrameBuffer,
    fs::Filesystem,
    icons::IconSource,
    input::{Button, Keypad},
    power::{PowerMonitor, SenseHardware},
    render::{self, PageView},
    state::{LAUNCHER, LauncherState, StateStore},
};

/// Poll interval while waiting for the buttons to be let go.
const RELEASE_POLL_MS: u32 = 10;

/// The badge itself: panel, buttons and power latch.
pub trait Badge: Display + PowerLatch + Keypad {}

impl<T: Display + PowerLatch + Keypad> Badge for T {}

/// Runs installed apps. On the badge this does not return; a return means
/// the app exited (or failed to start) and the launcher takes over again.
pub trait AppHost<B: Badge> {
    fn run(&mut self, app: &AppEntry, badge: &mut B) -> Result<(), AppError>;
}

/// How the launcher came up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootPath {
    /// A and C held at power-up while an app was running: menu drawn fresh.
    ExitedApp,
    /// The persisted app was resumed and has since handed control back.
    Resumed,
    /// Cold boot or timer wake: menu drawn.
    Menu,
    /// Woken by a button: the panel still shows the last menu, the press
    /// is dispatched by the first loop iteration.
    WokenByButton,
}

pub struct LauncherContext<B, S, H, T, A>
where
    B: Badge,
    S: Filesystem + IconSource,
    H: SenseHardware,
    T: DelayNs,
    A: AppHost<B>,
{
    pub badge: B,
    pub storage: S,
    pub power: PowerMonitor<H>,
    pub delay: T,
    pub host: A,
    config: LauncherConfig,
    store: StateStore,
    apps: Vec<AppEntry>,
    max_page: usize,
    state: LauncherState,
    dirty: bool,
    speed: RefreshSpeed,
    frame: FrameBuffer,
}

impl<B, S, H, T, A> LauncherContext<B, S, H, T, A>
where
    B: Badge,
    S: Filesystem + IconSource,
    H: SenseHardware,
    T: DelayNs,
    A: AppHost<B>,
{
    pub fn new(badge: B, storage: S, sense: H, delay: T, host: A, config: LauncherConfig) -> Self {
        let power = PowerMonitor::new(sense, config.battery);
        let store = StateStore::new(&config.state_dir);
        Self {
            badge,
            storage,
            power,
            delay,
            host,
            config,
            store,
            apps: Vec::new(),
            max_page: 0,
            state: LauncherState::default(),
            dirty: false,
            speed: RefreshSpeed::Medium,
            frame: FrameBuffer::new(),
        }
    }

    pub fn state(&self) -> &LauncherState {
        &self.state
    }

    pub fn apps(&self) -> &[AppEntry] {
        &self.apps
    }

    pub fn max_page(&self) -> usize {
        self.max_page
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Power-up sequence: exit gesture or resume, then the menu. Storage
    /// failures are logged and end in a menu render; boot itself cannot fail.
    pub fn boot(&mut self) -> BootPath {
        let woken_by_button = self.badge.woken_by_button();

        let mut path = None;
        if self.badge.held_at_boot(Button::A) && self.badge.held_at_boot(Button::C) {
            if self.store.clear_running(&self.storage) {
                log::info!("Exit gesture held at boot, returning to launcher");
                path = Some(BootPath::ExitedApp);
            }
            self.badge.reset_held_at_boot();
        }

        self.state = self.store.load(&self.storage, LAUNCHER);
        self.apps = match apps::discover(&self.storage, &self.config) {
            Ok(apps) => apps,
            Err(err) => {
                log::error!("App discovery failed: {}", err);
                Vec::new()
            }
        };
        self.max_page = apps::max_page(self.apps.len());
        if self.state.clamp_page(self.max_page) {
            log::info!("Persisted page out of range, showing page {}", self.state.page);
            self.dirty = true;
        }

        if path.is_none() {
            match self.state_launch() {
                Ok(true) => path = Some(BootPath::Resumed),
                Ok(false) => {}
                Err(err) => {
                    log::error!("Resume failed: {}", err);
                    self.state.running = LAUNCHER.into();
                    self.dirty = true;
                    path = Some(BootPath::Menu);
                }
            }
        }

        let path = match path {
            Some(path) => path,
            None if woken_by_button => BootPath::WokenByButton,
            None => BootPath::Menu,
        };
        // A resumed app already redrew the menu on its way out.
        if matches!(path, BootPath::ExitedApp | BootPath::Menu) {
            self.wait_for_release();
            self.speed = RefreshSpeed::Medium;
            self.render_menu();
        }
        self.speed = RefreshSpeed::Fast;
        log::info!("Launcher up ({:?}), {} apps on {} pages", path, self.apps.len(), self.max_page);
        path
    }

    /// Resumes the app recorded as running, skipping the menu. Returns
    /// whether an app was handed control (and has since returned).
    pub fn state_launch(&mut self) -> Result<bool, LauncherError> {
        let Some(name) = self.state.running_app() else {
            return Ok(false);
        };
        log::info!("Resuming {}", name);
        let app = AppEntry::new(name, &self.config);
        self.launch(&app)?;
        Ok(true)
    }

    /// One pass of the main loop: latch power, dispatch presses, persist,
    /// then halt until the next wake. Failures are logged and answered with
    /// a fresh menu.
    pub fn tick(&mut self) {
        self.badge.keepalive();
        if let Err(err) = self.dispatch_and_persist() {
            log::error!("Launcher iteration failed: {}", err);
            self.render_menu();
        }
        self.badge.halt();
    }

    fn dispatch_and_persist(&mut self) -> Result<(), LauncherError> {
        let buttons = self.badge.poll();
        for button in Button::ALL {
            if buttons.is_pressed(button) {
                self.handle_button(button)?;
            }
        }
        self.persist_if_dirty()
    }

    pub fn handle_button(&mut self, button: Button) -> Result<(), LauncherError> {
        match button {
            Button::A | Button::B | Button::C => {
                let Some(slot) = button.slot() else {
                    return Ok(());
                };
                self.wait_for_release();
                self.launch_slot(slot)
            }
            Button::Up => {
                self.set_page(self.state.page.saturating_sub(1));
                Ok(())
            }
            Button::Down => {
                self.set_page((self.state.page + 1).min(apps::last_page(self.apps.len())));
                Ok(())
            }
        }
    }

    fn set_page(&mut self, page: usize) {
        if page != self.state.page {
            log::debug!("Page {} -> {}", self.state.page, page);
            self.state.page = page;
            self.dirty = true;
        }
        self.render_menu();
    }

    /// Writes the launcher record if a page change is pending. Called once
    /// per loop iteration so repeated presses cost one write.
    pub fn persist_if_dirty(&mut self) -> Result<(), LauncherError> {
        if !self.dirty {
            return Ok(());
        }
        self.store.save(&self.storage, LAUNCHER, &self.state)?;
        self.dirty = false;
        Ok(())
    }

    pub fn launch_slot(&mut self, slot: usize) -> Result<(), LauncherError> {
        let index = self.state.page * SLOTS_PER_PAGE + slot;
        let Some(app) = self.apps.get(index).cloned() else {
            log::info!("Slot {} on page {} is empty", slot, self.state.page);
            return Ok(());
        };
        self.launch(&app)
    }

    /// Hands control to `app`. Returns once the app has exited, after the
    /// menu has been redrawn.
    pub fn launch(&mut self, app: &AppEntry) -> Result<(), LauncherError> {
        log::info!("Launching {} ({})", app.name, app.path);
        // Page and running are written together so a resume lands on the same page.
        self.state = self.store.set_running(&self.storage, &self.state, &app.name)?;
        self.dirty = false;
        self.frame.fill(BinaryColor::On);

        let result = self.host.run(app, &mut self.badge);

        match result {
            Ok(()) => log::info!("{} exited", app.name),
            Err(err) => {
                log::error!("{} failed: {}", app.name, err);
                render::render_warning(&mut self.frame, &mut self.badge, &self.config.title, &err.to_string());
            }
        }
        self.store.clear_running(&self.storage);
        self.state.running = LAUNCHER.into();
        self.wait_for_release();
        self.speed = RefreshSpeed::Medium;
        self.render_menu();
        self.speed = RefreshSpeed::Fast;
        Ok(())
    }

    fn wait_for_release(&mut self) {
        while self.badge.poll().any_down() {
            self.delay.delay_ms(RELEASE_POLL_MS);
        }
    }

    /// Samples power and disk, draws the current page and refreshes once.
    pub fn render_menu(&mut self) {
        let power = self.power.read(&mut self.delay);
        let disk = match disk::probe(&self.storage) {
            Ok(usage) => Some(usage),
            Err(err) => {
                log::warn!("Disk usage unavailable: {}", err);
                None
            }
        };
        let view = PageView {
            title: &self.config.title,
            apps: apps::page_slots(&self.apps, self.state.page),
            page: self.state.page,
            max_page: self.max_page,
            power,
            disk,
        };
        render::render_page(&mut self.frame, &mut self.storage, &mut self.badge, &view, self.speed);
    }
}
