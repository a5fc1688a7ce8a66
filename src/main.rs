mod notify;
mod ui;

use std::fs::OpenOptions;
use std::io::{stdout, Stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lap_core::{Clock, Registry, RunnerId};

use crate::notify::Notices;

const MIN_REFRESH_MS: u64 = 10;

#[derive(Parser, Debug)]
#[command(
    name = "lapboard",
    version,
    about = "Multi-runner stopwatch with per-runner lap tracking"
)]
struct Cli {
    /// Display refresh interval in milliseconds while the clock runs
    #[arg(long = "refresh-ms", default_value_t = 50)]
    refresh_ms: u64,

    /// Whitespace-separated runner names to put on the board at startup
    #[arg(long = "runners")]
    runners: Option<String>,

    /// Append logs to this file; without it logging is disabled, since
    /// the board owns stdout
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Pump,
}

enum PumpCmd {
    Start(u64),
    Stop,
    Quit,
}

struct LapboardApp {
    clock: Clock,
    registry: Registry,
    notices: Notices,
    /// Origin of the injected millisecond timeline.
    epoch: Instant,
    screen: (u16, u16),
    cursor: usize,
    refresh_ms: u64,
    pump_tx: Sender<PumpCmd>,
    pump_running: bool,
    help_visible: bool,
    confirm_exit: bool,
    confirm_delete: Option<RunnerId>,
    name_input: Option<String>,
    quit: bool,
}

impl LapboardApp {
    fn new(refresh_ms: u64, pump_tx: Sender<PumpCmd>, screen: (u16, u16)) -> Self {
        Self {
            clock: Clock::new(),
            registry: Registry::new(),
            notices: Notices::new(),
            epoch: Instant::now(),
            screen,
            cursor: 0,
            refresh_ms,
            pump_tx,
            pump_running: false,
            help_visible: false,
            confirm_exit: false,
            confirm_delete: None,
            name_input: None,
            quit: false,
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn start_pump(&mut self) {
        if !self.pump_running {
            self.pump_running = true;
            self.pump_tx.send(PumpCmd::Start(self.refresh_ms)).ok();
        }
    }

    fn stop_pump(&mut self) {
        if self.pump_running {
            self.pump_running = false;
            self.pump_tx.send(PumpCmd::Stop).ok();
        }
    }

    fn seed_roster(&mut self, raw: &str) {
        for runner in self.registry.add_runners(raw) {
            tracing::info!(id = %runner.id(), name = runner.name(), "runner added");
        }
    }

    fn redraw(&mut self, w: &mut Stdout) -> std::io::Result<()> {
        if self.help_visible {
            return ui::draw_help(w, self.screen);
        }
        if self.confirm_exit {
            return ui::draw_confirm_exit(w, self.screen);
        }
        if let Some(id) = self.confirm_delete {
            if let Some(runner) = self.registry.runner(id) {
                return ui::draw_confirm_delete(w, self.screen, runner.name());
            }
        }
        if let Some(input) = &self.name_input {
            return ui::draw_add_runners(w, self.screen, input);
        }

        let now_ms = self.now_ms();
        let elapsed = self.clock.elapsed_ms(now_ms);
        let running = self.clock.is_running();
        let notice = self.notices.active(Instant::now()).map(str::to_string);
        ui::draw_board(
            w,
            self.screen,
            elapsed,
            running,
            &self.registry,
            self.cursor,
            notice.as_deref(),
        )
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.stop_pump();
            self.quit = true;
            return;
        }

        // Overlays swallow input before board keys are considered
        if self.help_visible {
            self.help_visible = false;
            return;
        }
        if self.confirm_exit {
            match key.code {
                KeyCode::Char('y') => {
                    self.stop_pump();
                    self.quit = true;
                }
                KeyCode::Char('n') | KeyCode::Esc => self.confirm_exit = false,
                _ => {}
            }
            return;
        }
        if let Some(id) = self.confirm_delete {
            match key.code {
                KeyCode::Char('y') => {
                    self.confirm_delete = None;
                    self.commit_delete(id);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.confirm_delete = None,
                _ => {}
            }
            return;
        }
        if let Some(input) = &mut self.name_input {
            match key.code {
                KeyCode::Char(c) => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter => {
                    let raw = self.name_input.take().unwrap_or_default();
                    self.commit_add(&raw);
                }
                KeyCode::Esc => self.name_input = None,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char(' ') => self.toggle_clock(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('a') => self.name_input = Some(String::new()),
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.registry.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('l') | KeyCode::Enter => self.record_lap(),
            KeyCode::Char('d') => {
                if let Some(runner) = self.registry.runners().get(self.cursor) {
                    self.confirm_delete = Some(runner.id());
                }
            }
            KeyCode::Char('?') | KeyCode::F(1) => self.help_visible = true,
            KeyCode::Char('q') => {
                if self.clock.is_running() {
                    self.confirm_exit = true;
                } else {
                    self.quit = true;
                }
            }
            _ => {}
        }
    }

    fn toggle_clock(&mut self) {
        let now_ms = self.now_ms();
        if self.clock.is_running() {
            self.clock.pause(now_ms);
            self.stop_pump();
            tracing::info!(elapsed_ms = self.clock.elapsed_ms(now_ms), "clock paused");
        } else {
            self.clock.start(now_ms);
            self.start_pump();
            tracing::info!("clock started");
        }
    }

    fn reset(&mut self) {
        self.stop_pump();
        self.clock.reset();
        // Laps reference the old timeline; a zeroed clock invalidates them
        self.registry.clear_laps();
        tracing::info!("clock reset, laps cleared");
    }

    fn commit_add(&mut self, raw: &str) {
        let now = Instant::now();
        let mut created = Vec::new();
        for runner in self.registry.add_runners(raw) {
            created.push((runner.id(), runner.name().to_string()));
        }
        for (id, name) in created {
            tracing::info!(id = %id, name = %name, "runner added");
            self.notices.push(format!("Added runner {}", name), now);
        }
    }

    fn record_lap(&mut self) {
        let Some(runner) = self.registry.runners().get(self.cursor) else {
            return;
        };
        let id = runner.id();
        let now_ms = self.now_ms();
        match self.registry.record_lap(id, &self.clock, now_ms) {
            Ok(lap) => {
                let name = self.registry.runner(id).map(|r| r.name()).unwrap_or("");
                self.notices
                    .push(format!("Lap {} for {}", lap.index, name), Instant::now());
                tracing::info!(
                    id = %id,
                    index = lap.index,
                    duration_ms = lap.duration_ms,
                    "lap recorded"
                );
            }
            // Reachable from ordinary double-presses; never corrupts state
            Err(err) => tracing::debug!(id = %id, %err, "lap ignored"),
        }
    }

    fn commit_delete(&mut self, id: RunnerId) {
        match self.registry.delete_runner(id) {
            Ok(removed) => {
                if self.cursor >= self.registry.len() && self.cursor > 0 {
                    self.cursor = self.registry.len() - 1;
                }
                self.notices
                    .push(format!("Deleted runner {}", removed.name()), Instant::now());
                tracing::info!(id = %id, name = removed.name(), "runner deleted");
            }
            Err(err) => tracing::debug!(id = %id, %err, "delete ignored"),
        }
    }
}

/// Emits a display-refresh tick every `interval_ms` while started. The
/// control channel mirrors the app's pump handle: `Start` (re)arms with
/// an interval, `Stop` parks the thread on the next command, `Quit` ends
/// it. Stopping guarantees no further tick is sent after the command is
/// processed.
fn pump_thread(ctrl: Receiver<PumpCmd>, events: Sender<AppEvent>) {
    let mut interval_ms = 50u64;
    let mut running = false;

    loop {
        let cmd = if running {
            match ctrl.recv_timeout(Duration::from_millis(interval_ms)) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => {
                    if events.send(AppEvent::Pump).is_err() {
                        return;
                    }
                    None
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        } else {
            // Block-wait when stopped
            match ctrl.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => return,
            }
        };

        if let Some(cmd) = cmd {
            match cmd {
                PumpCmd::Start(ms) => {
                    interval_ms = ms.max(MIN_REFRESH_MS);
                    running = true;
                }
                PumpCmd::Stop => running = false,
                PumpCmd::Quit => return,
            }
        }
    }
}

fn input_thread(events: Sender<AppEvent>) {
    loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if events.send(AppEvent::Key(key)).is_err() {
                    return;
                }
            }
            Ok(Event::Resize(cols, rows)) => {
                if events.send(AppEvent::Resize(cols, rows)).is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(%err, "input thread stopping");
                return;
            }
        }
    }
}

fn init_tracing(log_file: Option<&Path>) {
    let Some(path) = log_file else {
        return;
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %path.display(), "logging initialized");
        }
        Err(_) => {
            // Prefer no logs over writing into the raw-mode terminal
        }
    }
}

fn run(app: &mut LapboardApp, out: &mut Stdout, events: Receiver<AppEvent>) -> Result<()> {
    app.redraw(out).context("draw board")?;
    while !app.quit {
        match events.recv() {
            Ok(AppEvent::Key(key)) => {
                app.handle_key(key);
                app.redraw(out)?;
            }
            Ok(AppEvent::Resize(cols, rows)) => {
                app.screen = (cols, rows);
                app.redraw(out)?;
            }
            Ok(AppEvent::Pump) => app.redraw(out)?,
            Err(_) => break,
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref());

    let (event_tx, event_rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();

    let pump_events = event_tx.clone();
    thread::spawn(move || pump_thread(pump_rx, pump_events));
    thread::spawn(move || input_thread(event_tx));

    let screen = crossterm::terminal::size().context("query terminal size")?;
    let mut app = LapboardApp::new(cli.refresh_ms.max(MIN_REFRESH_MS), pump_tx, screen);
    if let Some(roster) = cli.runners.as_deref() {
        app.seed_roster(roster);
    }

    let mut out = stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(out, EnterAlternateScreen).context("enter alternate screen")?;

    let result = run(&mut app, &mut out, event_rx);

    // Restore the terminal before surfacing any error
    execute!(out, LeaveAlternateScreen).ok();
    disable_raw_mode().ok();
    app.pump_tx.send(PumpCmd::Quit).ok();

    result
}
