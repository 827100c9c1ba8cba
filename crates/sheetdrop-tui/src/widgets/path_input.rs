//! PathInput — single-line path prompt used as the file picker.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_input, C_INPUT_BG, C_MUTED};

const PROMPT: &str = "path> ";

pub enum PathInputAction {
    /// Enter pressed; carries the typed text.
    Submitted(String),
    Cancelled,
    Edited,
}

pub struct PathInput {
    input: Input,
    active: bool,
    placeholder: String,
}

impl PathInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            placeholder: placeholder.into(),
        }
    }

    pub fn open(&mut self) {
        self.input = Input::default();
        self.active = true;
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Esc closes the prompt, Enter submits it, anything else edits the text.
    pub fn handle_key(&mut self, key: KeyEvent) -> PathInputAction {
        match key.code {
            KeyCode::Esc => {
                self.close();
                PathInputAction::Cancelled
            }
            KeyCode::Enter => {
                self.close();
                PathInputAction::Submitted(self.input.value().to_string())
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                PathInputAction::Edited
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if area.width <= PROMPT.len() as u16 || area.height == 0 {
            return;
        }
        let width = area.width as usize - PROMPT.len();
        let scroll = self.input.visual_scroll(width.saturating_sub(1));
        let value = self.input.value();
        let body = if value.is_empty() {
            Span::styled(self.placeholder.as_str(), Style::default().fg(C_MUTED))
        } else {
            Span::styled(value.chars().skip(scroll).collect::<String>(), style_input())
        };
        let line = Line::from(vec![Span::styled(PROMPT, style_input()), body]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        if self.active {
            let cursor_x = area.x + PROMPT.len() as u16 + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_enter_submits_text() {
        let mut input = PathInput::new("type a path");
        input.open();
        for c in "~/a.xlsx".chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
        match input.handle_key(key(KeyCode::Enter)) {
            PathInputAction::Submitted(text) => assert_eq!(text, "~/a.xlsx"),
            _ => panic!("expected submission"),
        }
        assert!(!input.is_active());
    }

    #[test]
    fn test_escape_cancels_and_reopen_clears() {
        let mut input = PathInput::new("type a path");
        input.open();
        input.handle_key(key(KeyCode::Char('x')));
        assert!(matches!(input.handle_key(key(KeyCode::Esc)), PathInputAction::Cancelled));
        input.open();
        assert_eq!(input.input.value(), "");
    }
}
