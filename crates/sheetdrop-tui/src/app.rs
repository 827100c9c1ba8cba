//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns the components, the `Workflow` and `AppState` (shared read-only
//!   data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from the terminal
//!   reader and from the upload/download tasks.
//! - The event loop draws when something changed, then awaits the next message
//!   or timer tick.
//! - Components return `Vec<Action>`; App dispatches each Action.  Workflow
//!   events come back as `Effect`s, which the App carries out.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use sheetdrop_proto::client::{SelectedFile, TransferError, UploadClient};
use sheetdrop_proto::config::Config;
use sheetdrop_proto::protocol::ProcessResult;

use crate::{
    action::Action,
    app_state::{AppState, DownloadStatus},
    card_config::CardPresentation,
    component::Component,
    components::{
        alert_overlay::AlertOverlay, help_overlay::HelpOverlay,
        processing_panel::ProcessingPanel, results_panel::ResultsPanel,
        upload_panel::UploadPanel,
    },
    reveal::RevealTiming,
    theme::{C_ACCENT, C_SECONDARY},
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, ToastManager},
    },
    workflow::{Effect, Section, Workflow, WorkflowEvent, WorkflowState},
};

/// Reveal and exit-transition frame rate.
const ANIMATION_FPS: u64 = 60;
const UPLOAD_SECTION_H: u16 = 9;
const PROCESSING_SECTION_H: u16 = 6;
const MAX_LOG_LINES: usize = 500;

/// Everything that can wake the event loop besides its own timers.
#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    UploadFinished(Result<ProcessResult, TransferError>),
    DownloadProgress(u64, Option<u64>),
    DownloadFinished(Result<PathBuf, String>),
}

/// Where each section was last drawn, for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
struct SectionAreas {
    upload: Rect,
    results: Rect,
}

pub struct App {
    state: AppState,
    workflow: Workflow,
    client: UploadClient,
    tx: Option<mpsc::Sender<AppMessage>>,

    upload_panel: UploadPanel,
    processing_panel: ProcessingPanel,
    results_panel: ResultsPanel,
    alert: AlertOverlay,
    help_overlay: HelpOverlay,
    toast: ToastManager,

    /// Payload currently on screen; its uid names the artifact to download.
    shown_result: Option<ProcessResult>,
    areas: SectionAreas,
    /// The reveal was still running at the previous animation tick.
    reveal_running: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, client: UploadClient) -> Self {
        let timing = RevealTiming::from(&config.animation);
        let presentation = CardPresentation::with_overrides(&config.cards);
        let exit = Duration::from_millis(config.animation.exit_transition_ms);
        Self {
            state: AppState::new(
                client.base_url().to_string(),
                config.paths.downloads_dir.clone(),
            ),
            workflow: Workflow::new(exit),
            client,
            tx: None,
            upload_panel: UploadPanel::new(),
            processing_panel: ProcessingPanel::new(),
            results_panel: ResultsPanel::new(presentation, timing),
            alert: AlertOverlay::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            shown_result: None,
            areas: SectionAreas::default(),
            reveal_running: false,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    /// Run until the user quits.  `initial` is submitted as if it had been
    /// dropped right after start-up.
    pub async fn run(mut self, initial: Option<SelectedFile>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());
        self.push_log(format!("sheetdrop started, server {}", self.state.server_url));

        // ── Background task: keyboard/mouse/paste events ──────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        if let Some(file) = initial {
            self.dispatch(Action::SubmitFile(file));
        }

        // ── Periodic timers ───────────────────────────────────────────────────
        // Toast expiry + spinner: 100ms.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut anim_tick = tokio::time::interval(Duration::from_millis(1000 / ANIMATION_FPS));
        anim_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        redraw |= self.handle_message(next);
                    }
                    needs_redraw = redraw;
                }

                _ = toast_tick.tick() => {
                    let expired = self.toast.tick();
                    let busy = matches!(self.state.workflow, WorkflowState::Uploading { .. });
                    needs_redraw = expired || busy || !self.toast.is_empty();
                }

                // Only costs a frame while something is actually moving.
                _ = anim_tick.tick() => {
                    needs_redraw = self.animation_needs_redraw(Instant::now());
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;
        info!("sheetdrop exiting");

        Ok(())
    }

    /// Whether the animation tick has to draw a frame.  The first tick after
    /// the reveal completes still draws, so the settled counts reach the screen.
    fn animation_needs_redraw(&mut self, now: Instant) -> bool {
        let settled = self.state.sections.settle(now);
        let leaving = [Section::Upload, Section::Processing, Section::Results]
            .into_iter()
            .any(|s| self.state.sections.is_leaving(s, now));
        let animating = self.results_panel.is_animating(now);
        let just_finished = self.reveal_running && !animating;
        self.reveal_running = animating;
        settled || leaving || animating || just_finished
    }

    /// Returns true if the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Paste(text)) => {
                debug!("paste of {} bytes", text.len());
                if self.alert.is_open() || self.help_overlay.visible {
                    self.toast.warning("close the overlay before dropping a file");
                    return true;
                }
                let actions = self.upload_panel.handle_paste(&text, &self.state);
                for action in actions {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Resize(w, h)) => {
                self.dispatch(Action::Resize(w, h));
                true
            }
            AppMessage::Event(_) => false,

            AppMessage::UploadFinished(Ok(result)) => {
                self.apply_workflow(WorkflowEvent::UploadSucceeded(result));
                true
            }
            AppMessage::UploadFinished(Err(e)) => {
                self.apply_workflow(WorkflowEvent::UploadFailed(e));
                true
            }
            AppMessage::DownloadProgress(received, total) => {
                if self.state.download.is_running() {
                    self.state.download = DownloadStatus::Downloading { received, total };
                }
                true
            }
            AppMessage::DownloadFinished(Ok(path)) => {
                self.push_log(format!("saved {}", path.display()));
                self.toast.success(format!("saved {}", path.display()));
                self.state.download = DownloadStatus::Downloaded(path);
                true
            }
            AppMessage::DownloadFinished(Err(reason)) => {
                warn!("download failed: {}", reason);
                self.push_log(format!("download failed: {}", reason));
                self.toast.error("download failed");
                self.state.download = DownloadStatus::Failed(reason);
                true
            }
        }
    }

    // ── Input routing ─────────────────────────────────────────────────────────

    fn input_mode(&self) -> InputMode {
        if self.alert.is_open() {
            InputMode::Alert
        } else if self.upload_panel.is_picking() {
            InputMode::Picker
        } else {
            InputMode::Normal
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // The alert is modal: nothing else sees a key until it is acknowledged.
        if self.alert.is_open() {
            return self.alert.handle_key(key, &self.state);
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            let actions = self.help_overlay.handle_key(key, &self.state);
            if !actions.is_empty() {
                return actions;
            }
            return vec![Action::ToggleHelp];
        }

        if self.upload_panel.is_picking() {
            return self.upload_panel.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => return vec![Action::Quit],
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            _ => {}
        }

        match self.state.workflow {
            WorkflowState::Idle => self.upload_panel.handle_key(key, &self.state),
            WorkflowState::ResultsShown => self.results_panel.handle_key(key, &self.state),
            WorkflowState::Uploading { .. } => self.processing_panel.handle_key(key, &self.state),
            WorkflowState::Erroring => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.alert.is_open() || self.help_overlay.visible {
            return vec![];
        }
        let now = Instant::now();
        let mut actions = Vec::new();
        if self.state.sections.is_shown(Section::Upload, now) {
            actions.extend(
                self.upload_panel
                    .handle_mouse(event, self.areas.upload, &self.state),
            );
        }
        if self.state.sections.is_shown(Section::Results, now) {
            actions.extend(
                self.results_panel
                    .handle_mouse(event, self.areas.results, &self.state),
            );
        }
        actions
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Broadcast to components first so they can react (close the picker,
        // replay the reveal, toggle the help overlay).
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.upload_panel.on_action(&action, s));
            out.extend(self.results_panel.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // Dispatch any secondary actions (depth-limited to 1 level)
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match &action {
            Action::Resize(_, _) => {}
            _ => debug!("apply_action: {:?}", action),
        }
        match action {
            Action::SubmitFile(file) => {
                self.apply_workflow(WorkflowEvent::FileSelected(file));
            }
            Action::DismissAlert => {
                self.alert.close();
                self.apply_workflow(WorkflowEvent::AlertDismissed);
            }
            Action::StartDownload => self.start_download(),
            Action::CopyDownloadUrl => {
                let Some(url) = self.results_panel.download_url().map(str::to_string) else {
                    return;
                };
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url.clone())) {
                    Ok(()) => {
                        let display = if url.chars().count() > 40 {
                            format!("{}…", url.chars().take(40).collect::<String>())
                        } else {
                            url
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::ReplayReveal => {
                self.push_log("replaying results".to_string());
            }
            Action::Notify(severity, message) => self.toast.push(message, severity),
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp | Action::Resize(_, _) => {}
        }
    }

    // ── Workflow effects ──────────────────────────────────────────────────────

    fn apply_workflow(&mut self, event: WorkflowEvent) {
        let effects = self.workflow.apply(event);
        self.state.workflow = self.workflow.state().clone();
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        let now = Instant::now();
        for effect in effects {
            match effect {
                Effect::Show(section) => self.state.sections.show(section),
                Effect::Hide(section) => self.state.sections.hide(section),
                Effect::HideAfter(section, after) => {
                    self.state.sections.hide_after(section, now + after)
                }
                Effect::Dispatch(file) => self.spawn_upload(file),
                Effect::Render(result) => {
                    self.state.upload_started = None;
                    self.state.download = DownloadStatus::NotDownloaded;
                    let url = self.client.download_url(&result.uid);
                    self.results_panel.render(&result, url, now);
                    self.push_log(format!(
                        "processed: {} metrics, uid {}",
                        result.stats.len(),
                        result.uid
                    ));
                    self.shown_result = Some(result);
                }
                Effect::LogFailure(err) => {
                    error!("processing failed: {}", err);
                    self.state.upload_started = None;
                    self.results_panel.clear();
                    self.shown_result = None;
                    self.push_log(format!("processing failed: {}", err));
                }
                Effect::Alert(message) => self.alert.open(message),
                Effect::Ignored(reason) => {
                    warn!("ignored: {}", reason);
                    let severity = if self.state.workflow == WorkflowState::ResultsShown {
                        Severity::Info
                    } else {
                        Severity::Warning
                    };
                    self.toast.push(reason, severity);
                }
            }
        }
    }

    fn spawn_upload(&mut self, file: SelectedFile) {
        let Some(tx) = self.tx.clone() else {
            error!("upload requested before the event loop started");
            return;
        };
        self.state.upload_started = Some(Instant::now());
        self.push_log(format!("uploading {}", file.name));
        let client = self.client.clone();
        tokio::spawn(async move {
            let outcome = client.process(&file).await;
            let _ = tx.send(AppMessage::UploadFinished(outcome)).await;
        });
    }

    fn start_download(&mut self) {
        if self.state.download.is_running() {
            return;
        }
        let Some(uid) = self.shown_result.as_ref().map(|r| r.uid.clone()) else {
            return;
        };
        let Some(tx) = self.tx.clone() else {
            return;
        };
        self.state.download = DownloadStatus::Downloading {
            received: 0,
            total: None,
        };
        self.push_log(format!("downloading {}", self.client.download_url(&uid)));

        let client = self.client.clone();
        let dest = self.state.downloads_dir.clone();
        tokio::spawn(async move {
            let progress_tx = tx.clone();
            let outcome = client
                .download(&uid, &dest, |received, total| {
                    // Progress is best-effort; a full channel just skips a frame.
                    let _ = progress_tx.try_send(AppMessage::DownloadProgress(received, total));
                })
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(AppMessage::DownloadFinished(outcome)).await;
        });
    }

    fn push_log(&mut self, msg: String) {
        let stamped = format!("{} {}", chrono::Local::now().format("%H:%M:%S"), msg);
        self.state.logs.push(stamped);
        if self.state.logs.len() > MAX_LOG_LINES {
            self.state.logs.remove(0);
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let now = Instant::now();

        // ── Outer layout: header | body | separator | log | keys ─────────────
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(frame, outer[0]);

        // ── Body: visible sections, top to bottom ────────────────────────────
        let shown: Vec<Section> = [Section::Upload, Section::Processing, Section::Results]
            .into_iter()
            .filter(|&s| self.state.sections.is_shown(s, now))
            .collect();
        let mut constraints: Vec<Constraint> = shown
            .iter()
            .map(|s| match s {
                Section::Upload => Constraint::Length(UPLOAD_SECTION_H),
                Section::Processing => Constraint::Length(PROCESSING_SECTION_H),
                Section::Results => Constraint::Min(0),
            })
            .collect();
        if !shown.contains(&Section::Results) {
            constraints.push(Constraint::Min(0));
        }
        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(outer[1]);

        self.areas = SectionAreas::default();
        for (section, rect) in shown.iter().zip(body.iter()) {
            match section {
                Section::Upload => {
                    self.areas.upload = *rect;
                    self.upload_panel.draw(frame, *rect, &self.state);
                }
                Section::Processing => {
                    self.processing_panel.draw(frame, *rect, &self.state);
                }
                Section::Results => {
                    self.areas.results = *rect;
                    self.results_panel.draw(frame, *rect, &self.state);
                }
            }
        }

        // ── Status bar ────────────────────────────────────────────────────────
        status_bar::draw_separator(frame, outer[2]);
        status_bar::draw_log_bar(
            frame,
            outer[3],
            &self.state.workflow,
            self.state.logs.last().map(String::as_str),
        );
        status_bar::draw_keys_bar(frame, outer[4], self.input_mode(), &self.state.workflow);

        // ── Overlays (on top of everything) ──────────────────────────────────
        self.help_overlay.draw(frame, area, &self.state);
        self.alert.draw(frame, area, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(
                " sheetdrop ",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("→ {}", self.state.server_url),
                Style::default().fg(C_SECONDARY),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}
