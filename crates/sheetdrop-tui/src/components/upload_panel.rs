//! UploadPanel — the drop target and the file picker.
//!
//! Pointer movement in and out of the panel drives the drag highlight; a
//! bracketed paste is the drop itself.  `o`, Enter or a click opens the path
//! prompt, which feeds the same first-file selection as a drop.

use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    intake::{files_from_text, first_file, DragEvent, DropZone},
    theme::{C_ACCENT, C_MUTED, C_PANEL_BORDER_ACTIVE, C_PRIMARY, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        path_input::{PathInput, PathInputAction},
        toast::Severity,
    },
    workflow::{Section, WorkflowState},
};

pub struct UploadPanel {
    drop_zone: DropZone,
    picker: PathInput,
}

impl UploadPanel {
    pub fn new() -> Self {
        Self {
            drop_zone: DropZone::new(),
            picker: PathInput::new("path to a spreadsheet (~ and file:// accepted)"),
        }
    }

    /// The path prompt currently owns the keyboard.
    pub fn is_picking(&self) -> bool {
        self.picker.is_active()
    }

    pub fn is_highlighted(&self) -> bool {
        self.drop_zone.is_active()
    }

    /// Feed one drag event to the drop target and turn a selection into an action.
    fn drag(&mut self, event: DragEvent) -> Vec<Action> {
        let was_drop = matches!(event, DragEvent::Drop(_));
        let outcome = self.drop_zone.handle(event);
        // A consumed drop never lands in half-typed picker text.
        if was_drop && outcome.default_prevented {
            self.picker.close();
        }
        match outcome.selection {
            Some(file) => vec![Action::SubmitFile(file)],
            None if was_drop => vec![Action::Notify(
                Severity::Info,
                "nothing to upload in that drop".to_string(),
            )],
            None => vec![],
        }
    }

    fn submit_typed(&mut self, text: &str) -> Vec<Action> {
        if text.trim().is_empty() {
            return vec![];
        }
        match first_file(files_from_text(text)) {
            Some(file) => vec![Action::SubmitFile(file)],
            None => vec![Action::Notify(
                Severity::Warning,
                format!("no such file: {}", text.trim()),
            )],
        }
    }
}

impl Default for UploadPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
}

impl Component for UploadPanel {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.picker.is_active() {
            return match self.picker.handle_key(key) {
                PathInputAction::Submitted(text) => self.submit_typed(&text),
                PathInputAction::Cancelled | PathInputAction::Edited => vec![],
            };
        }
        match key.code {
            KeyCode::Char('o') | KeyCode::Enter if state.workflow == WorkflowState::Idle => {
                self.picker.open();
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let inside = hit(area, event.column, event.row);
        match event.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                if inside {
                    let ev = if self.drop_zone.is_active() {
                        DragEvent::Over
                    } else {
                        DragEvent::Enter
                    };
                    self.drag(ev)
                } else if self.drop_zone.is_active() {
                    self.drag(DragEvent::Leave)
                } else {
                    vec![]
                }
            }
            MouseEventKind::Down(MouseButton::Left)
                if inside && state.workflow == WorkflowState::Idle =>
            {
                self.picker.open();
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_paste(&mut self, text: &str, _state: &AppState) -> Vec<Action> {
        self.drag(DragEvent::Drop(files_from_text(text)))
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::SubmitFile(_) = action {
            self.picker.close();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let leaving = state.sections.is_leaving(Section::Upload, Instant::now());
        let highlighted = self.drop_zone.is_active() && !leaving;
        let badge = highlighted.then_some(Badge {
            text: "DROP",
            color: C_PANEL_BORDER_ACTIVE,
        });
        let block = pane_chrome("upload", highlighted, leaving, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let (headline, hint) = if leaving {
            (Style::default().fg(C_MUTED), Style::default().fg(C_MUTED))
        } else if highlighted {
            (
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                Style::default().fg(C_SECONDARY),
            )
        } else {
            (
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                Style::default().fg(C_SECONDARY),
            )
        };
        let pad = rows[0].height.saturating_sub(2) / 2;
        let mut lines: Vec<Line> = (0..pad).map(|_| Line::from("")).collect();
        lines.push(Line::from(Span::styled(
            if highlighted {
                "release to upload"
            } else {
                "drop a spreadsheet onto this window"
            },
            headline,
        )));
        lines.push(Line::from(Span::styled(
            "or press o to type a path",
            hint,
        )));
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            rows[0],
        );

        if self.picker.is_active() {
            self.picker.draw(frame, rows[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;
    use std::path::PathBuf;

    fn state() -> AppState {
        AppState::new("http://127.0.0.1:8000".to_string(), PathBuf::from("/tmp"))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 40,
        height: 10,
    };

    #[test]
    fn test_pointer_enter_and_leave_toggle_highlight() {
        let mut panel = UploadPanel::new();
        let s = state();
        panel.handle_mouse(mouse(MouseEventKind::Moved, 5, 5), AREA, &s);
        assert!(panel.is_highlighted());
        panel.handle_mouse(mouse(MouseEventKind::Moved, 6, 5), AREA, &s);
        assert!(panel.is_highlighted());
        panel.handle_mouse(mouse(MouseEventKind::Moved, 60, 20), AREA, &s);
        assert!(!panel.is_highlighted());
    }

    #[test]
    fn test_paste_of_existing_file_submits_it() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("leads.xlsx");
        let second = dir.path().join("other.xlsx");
        std::fs::write(&first, b"x").unwrap();
        std::fs::write(&second, b"y").unwrap();

        let mut panel = UploadPanel::new();
        let text = format!("'{}' '{}'", first.display(), second.display());
        let actions = panel.handle_paste(&text, &state());
        match actions.as_slice() {
            [Action::SubmitFile(file)] => {
                assert_eq!(file.path, first);
                assert_eq!(file.name, "leads.xlsx");
            }
            other => panic!("unexpected actions: {:?}", other),
        }
        assert!(!panel.is_highlighted());
    }

    #[test]
    fn test_paste_without_files_submits_nothing() {
        let mut panel = UploadPanel::new();
        let actions = panel.handle_paste("just some words", &state());
        assert!(matches!(actions.as_slice(), [Action::Notify(Severity::Info, _)]));
    }

    #[test]
    fn test_picker_submission_of_missing_path_warns() {
        let mut panel = UploadPanel::new();
        let s = state();
        panel.handle_key(key(KeyCode::Char('o')), &s);
        assert!(panel.is_picking());
        for c in "/definitely/not/here.xlsx".chars() {
            panel.handle_key(key(KeyCode::Char(c)), &s);
        }
        let actions = panel.handle_key(key(KeyCode::Enter), &s);
        assert!(matches!(actions.as_slice(), [Action::Notify(Severity::Warning, _)]));
        assert!(!panel.is_picking());
    }

    #[test]
    fn test_picker_only_opens_when_idle() {
        let mut panel = UploadPanel::new();
        let mut s = state();
        s.workflow = WorkflowState::ResultsShown;
        panel.handle_key(key(KeyCode::Char('o')), &s);
        assert!(!panel.is_picking());
    }
}
