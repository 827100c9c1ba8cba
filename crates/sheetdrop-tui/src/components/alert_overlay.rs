//! AlertOverlay — blocking failure notice.  While open it takes every key and
//! only lets the user acknowledge it.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_ERROR, C_MUTED, C_PRIMARY},
};

pub struct AlertOverlay {
    message: Option<String>,
}

impl AlertOverlay {
    pub fn new() -> Self {
        Self { message: None }
    }

    pub fn open(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn close(&mut self) {
        self.message = None;
    }

    pub fn is_open(&self) -> bool {
        self.message.is_some()
    }
}

impl Default for AlertOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for AlertOverlay {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.is_open() {
            return vec![];
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                self.close();
                vec![Action::DismissAlert]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        let Some(message) = self.message.as_deref() else {
            return;
        };
        let width = (message.chars().count() as u16 + 6)
            .clamp(30, 64)
            .min(area.width);
        let height = 6.min(area.height);
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        };

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(C_PRIMARY))),
            Line::from(""),
            Line::from(Span::styled(
                "press Enter to continue",
                Style::default().fg(C_MUTED),
            )),
        ];
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Thick)
                        .border_style(Style::default().fg(C_ERROR))
                        .title(Span::styled(
                            " error ",
                            Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD),
                        )),
                ),
            popup,
        );
    }
}
