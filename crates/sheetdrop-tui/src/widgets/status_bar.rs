//! Status bar — bottom lines with workflow state, last log line and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ERROR, C_MUTED, C_PENDING, C_SECONDARY, C_SEPARATOR, C_SUCCESS};
use crate::workflow::WorkflowState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    /// The file-picker prompt owns the keyboard.
    Picker,
    /// A blocking alert owns the keyboard.
    Alert,
}

fn state_color(state: &WorkflowState) -> Color {
    match state {
        WorkflowState::Idle => C_SECONDARY,
        WorkflowState::Uploading { .. } => C_PENDING,
        WorkflowState::Erroring => C_ERROR,
        WorkflowState::ResultsShown => C_SUCCESS,
    }
}

/// Draw the log bar: state badge plus the last log line.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, state: &WorkflowState, last_log: Option<&str>) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", state.label()),
            Style::default()
                .fg(state_color(state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Keybinding hints for the current mode and workflow state.
pub fn key_hints(mode: InputMode, state: &WorkflowState) -> &'static str {
    match mode {
        InputMode::Picker => " type a path  Enter upload  Esc cancel",
        InputMode::Alert => " Enter/Esc dismiss",
        InputMode::Normal => match state {
            WorkflowState::Idle => " drop a file here  o/Enter pick a file  ? help  q quit",
            WorkflowState::Uploading { .. } => " processing…  ? help  q quit",
            WorkflowState::Erroring => " Enter/Esc dismiss",
            WorkflowState::ResultsShown => {
                " d/Enter download  y copy link  r replay  j/k scroll  ? help  q quit"
            }
        },
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, state: &WorkflowState) {
    let line = Line::from(Span::styled(
        key_hints(mode, state),
        Style::default().fg(C_MUTED),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
