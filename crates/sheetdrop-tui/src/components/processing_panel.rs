//! ProcessingPanel — busy indicator while the upload request is in flight.

use std::time::{Duration, Instant};

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_PENDING, C_PRIMARY, C_SECONDARY},
    widgets::pane_chrome::{pane_chrome, Badge},
    workflow::WorkflowState,
};

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const SPINNER_STEP: Duration = Duration::from_millis(100);

/// Spinner glyph for a request that has been running for `elapsed`.
fn spinner(elapsed: Duration) -> &'static str {
    let step = (elapsed.as_millis() / SPINNER_STEP.as_millis()) as usize;
    SPINNER_FRAMES[step % SPINNER_FRAMES.len()]
}

fn fmt_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{}m {:02}s", elapsed.as_secs() / 60, elapsed.as_secs() % 60)
    }
}

pub struct ProcessingPanel;

impl ProcessingPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessingPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ProcessingPanel {
    // Nothing to do while waiting; the request cannot be cancelled.
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let block = pane_chrome(
            "processing",
            false,
            false,
            Some(Badge {
                text: "BUSY",
                color: C_PENDING,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let elapsed = state
            .upload_started
            .map(|t| Instant::now().saturating_duration_since(t))
            .unwrap_or_default();
        let file_name = match &state.workflow {
            WorkflowState::Uploading { file_name } => file_name.as_str(),
            _ => "",
        };

        let pad = inner.height.saturating_sub(2) / 2;
        let mut lines: Vec<Line> = (0..pad).map(|_| Line::from("")).collect();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", spinner(elapsed)),
                Style::default().fg(C_PENDING),
            ),
            Span::styled(
                "processing ",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(file_name, Style::default().fg(C_PRIMARY)),
        ]));
        lines.push(Line::from(Span::styled(
            format!("{} · {}", fmt_elapsed(elapsed), state.server_url),
            Style::default().fg(C_SECONDARY),
        )));
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }
}
