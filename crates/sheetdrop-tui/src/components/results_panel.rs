//! ResultsPanel — statistic cards with the staged count-up reveal, plus the
//! link to the processed file.
//!
//! `render` rebuilds the card list from a `ProcessResult` (one card per stat,
//! in payload order) and starts a fresh reveal.  Drawing only samples the
//! reveal at the current instant, so the App just has to keep redrawing while
//! `is_animating` holds.
//!
//! When the grid holds fewer rows than there are cards, it scrolls by whole
//! rows and a marker line counts the cards out of view.

use std::ops::Range;
use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use sheetdrop_proto::protocol::ProcessResult;

use crate::{
    action::Action,
    app_state::{AppState, DownloadStatus},
    card_config::{CardPresentation, Decoration},
    component::Component,
    reveal::{format_count, CardFrame, Reveal, RevealTiming},
    theme::{
        style_emphasis, C_ACCENT, C_CARD_BORDER, C_CARD_EMPHASIS, C_ERROR, C_LINK, C_MUTED,
        C_PRIMARY, C_SECONDARY, C_SUCCESS,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::draw_progress,
    },
};

const CARD_W: u16 = 24;
const CARD_H: u16 = 4;
const BUTTON_LABEL: &str = "[ ⤓ download processed file ]";

/// One statistic card, in the order the service reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub metric: String,
    pub decoration: Decoration,
    pub target: u64,
}

pub struct ResultsPanel {
    presentation: CardPresentation,
    timing: RevealTiming,
    cards: Vec<StatCard>,
    reveal: Option<Reveal>,
    download_url: Option<String>,
    /// Where the download button was last drawn, for clicks.
    button_area: Option<Rect>,
    /// First card row on screen.
    scroll: usize,
    viewport: Viewport,
}

/// Card grid capacity as of the last draw.  Zero columns means never drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Viewport {
    cols: usize,
    rows: usize,
}

impl ResultsPanel {
    pub fn new(presentation: CardPresentation, timing: RevealTiming) -> Self {
        Self {
            presentation,
            timing,
            cards: Vec::new(),
            reveal: None,
            download_url: None,
            button_area: None,
            scroll: 0,
            viewport: Viewport::default(),
        }
    }

    /// Replace whatever was shown with the cards for `result` and start the reveal.
    pub fn render(&mut self, result: &ProcessResult, download_url: String, now: Instant) {
        self.clear();
        self.cards = result
            .stats
            .iter()
            .map(|stat| StatCard {
                metric: stat.metric.clone(),
                decoration: self.presentation.decoration(&stat.metric).clone(),
                target: stat.count,
            })
            .collect();
        let targets = self.cards.iter().map(|c| c.target).collect();
        self.reveal = Some(Reveal::start(self.timing, targets, now));
        self.download_url = Some(download_url);
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.reveal = None;
        self.download_url = None;
        self.button_area = None;
        self.scroll = 0;
    }

    pub fn cards(&self) -> &[StatCard] {
        &self.cards
    }

    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    pub fn replay(&mut self, now: Instant) {
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.restart(now);
        }
    }

    pub fn frames(&self, now: Instant) -> Vec<CardFrame> {
        self.reveal
            .as_ref()
            .map(|r| r.frames(now))
            .unwrap_or_default()
    }

    /// True while some card still needs another frame.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.reveal.as_ref().is_some_and(|r| !r.is_finished(now))
    }

    fn total_rows(&self) -> usize {
        match self.viewport.cols {
            0 => 0,
            cols => self.cards.len().div_ceil(cols),
        }
    }

    fn max_scroll(&self) -> usize {
        self.total_rows().saturating_sub(self.viewport.rows)
    }

    /// Move the grid by `delta` card rows, clamped to the cards there are.
    pub fn scroll_by(&mut self, delta: isize) {
        let next = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize)
        };
        self.scroll = next.min(self.max_scroll());
    }

    /// Indices of the cards that fit on screen at the current scroll.
    pub fn visible_cards(&self) -> Range<usize> {
        let Viewport { cols, rows } = self.viewport;
        if cols == 0 {
            return 0..self.cards.len();
        }
        let start = (self.scroll * cols).min(self.cards.len());
        let end = ((self.scroll + rows) * cols).min(self.cards.len());
        start..end
    }

    pub fn hidden_above(&self) -> usize {
        self.visible_cards().start
    }

    pub fn hidden_below(&self) -> usize {
        self.cards.len() - self.visible_cards().end
    }

    fn set_viewport(&mut self, cols: usize, rows: usize) {
        self.viewport = Viewport { cols, rows };
        // A taller terminal may leave the old offset past the end.
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn draw_card(frame: &mut Frame, area: Rect, card: &StatCard, card_frame: CardFrame) {
        let emphasize = card.decoration.emphasize;
        let border = if emphasize { C_CARD_EMPHASIS } else { C_CARD_BORDER };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if emphasize {
                BorderType::Double
            } else {
                BorderType::Rounded
            })
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let label = if card.decoration.icon.is_empty() {
            card.metric.clone()
        } else {
            format!("{} {}", card.decoration.icon, card.metric)
        };
        let value_style = if emphasize {
            style_emphasis()
        } else if card_frame.settled {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD)
        };
        let lines = vec![
            Line::from(Span::styled(
                truncate_to_width(&label, inner.width as usize),
                Style::default().fg(C_SECONDARY),
            )),
            Line::from(Span::styled(format_count(card_frame.value), value_style)),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn draw_overflow(&self, frame: &mut Frame, area: Rect) {
        let (above, below) = (self.hidden_above(), self.hidden_below());
        if above == 0 && below == 0 {
            return;
        }
        let mut parts = Vec::new();
        if above > 0 {
            parts.push(format!("↑ {} above", above));
        }
        if below > 0 {
            parts.push(format!("↓ {} more", below));
        }
        parts.push("j/k scroll".to_string());
        frame.render_widget(
            Paragraph::new(Span::styled(parts.join(" · "), Style::default().fg(C_MUTED)))
                .alignment(Alignment::Right),
            area,
        );
    }

    fn draw_download(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let Some(url) = self.download_url.as_deref() else {
            return;
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let button_w = (BUTTON_LABEL.width() as u16).min(rows[0].width);
        self.button_area = Some(Rect {
            width: button_w,
            height: 1,
            ..rows[0]
        });
        let url_room = rows[0].width.saturating_sub(button_w + 1) as usize;
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    BUTTON_LABEL,
                    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(
                    truncate_to_width(url, url_room),
                    Style::default().fg(C_LINK).add_modifier(Modifier::UNDERLINED),
                ),
            ])),
            rows[0],
        );

        match &state.download {
            DownloadStatus::NotDownloaded => {}
            DownloadStatus::Downloading { received, total } => {
                draw_progress(frame, rows[1], *received, *total);
            }
            DownloadStatus::Downloaded(path) => {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        format!("✓ saved to {}", path.display()),
                        Style::default().fg(C_SUCCESS),
                    )),
                    rows[1],
                );
            }
            DownloadStatus::Failed(reason) => {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        format!("✗ download failed: {}", reason),
                        Style::default().fg(C_ERROR),
                    )),
                    rows[1],
                );
            }
        }
    }
}

/// Cut `s` to at most `max` terminal columns, ending in `…` when shortened.
fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

impl Component for ResultsPanel {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || self.download_url.is_none() {
            return vec![];
        }
        match key.code {
            KeyCode::Char('d') | KeyCode::Enter if !state.download.is_running() => {
                vec![Action::StartDownload]
            }
            KeyCode::Char('y') => vec![Action::CopyDownloadUrl],
            KeyCode::Char('r') => vec![Action::ReplayReveal],
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_by(1);
                vec![]
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_by(-1);
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let inside = event.column >= area.x
            && event.column < area.x + area.width
            && event.row >= area.y
            && event.row < area.y + area.height;
        let clicked = self.button_area.is_some_and(|button| {
            event.column >= button.x
                && event.column < button.x + button.width
                && event.row == button.y
        });
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if clicked && !state.download.is_running() => {
                vec![Action::StartDownload]
            }
            MouseEventKind::ScrollDown if inside => {
                self.scroll_by(1);
                vec![]
            }
            MouseEventKind::ScrollUp if inside => {
                self.scroll_by(-1);
                vec![]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ReplayReveal = action {
            self.replay(Instant::now());
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let count = format!("{} METRICS", self.cards.len());
        let block = pane_chrome(
            "results",
            false,
            false,
            Some(Badge {
                text: &count,
                color: C_SUCCESS,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(CARD_H),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(inner);
        let grid = parts[0];

        self.set_viewport(
            (grid.width / CARD_W).max(1) as usize,
            (grid.height / CARD_H) as usize,
        );
        let cols = self.viewport.cols;
        let range = self.visible_cards();
        let frames = self.frames(Instant::now());
        let on_screen = self
            .cards
            .iter()
            .zip(frames)
            .skip(range.start)
            .take(range.len());
        for (slot, (card, card_frame)) in on_screen.enumerate() {
            if !card_frame.visible {
                continue;
            }
            let x = grid.x + (slot % cols) as u16 * CARD_W;
            let y = grid.y + (slot / cols) as u16 * CARD_H;
            let card_area = Rect {
                x,
                y,
                width: (CARD_W - 1).min(grid.x + grid.width - x),
                height: CARD_H,
            };
            Self::draw_card(frame, card_area, card, card_frame);
        }

        self.draw_overflow(frame, parts[1]);
        self.draw_download(frame, parts[2], state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sheetdrop_proto::protocol::{download_url, StatEntry};

    fn result(stats: &[(&str, u64)]) -> ProcessResult {
        ProcessResult {
            uid: "abc123".to_string(),
            stats: stats.iter().map(|&(m, c)| StatEntry::new(m, c)).collect(),
        }
    }

    fn panel() -> ResultsPanel {
        ResultsPanel::new(CardPresentation::builtin(), RevealTiming::default())
    }

    #[test]
    fn test_render_builds_one_card_per_stat_in_order() {
        let mut p = panel();
        let stats = [("Total Rows", 120), ("Valid Emails", 98), ("Custom", 4)];
        p.render(&result(&stats), "u".to_string(), Instant::now());
        let metrics: Vec<&str> = p.cards().iter().map(|c| c.metric.as_str()).collect();
        assert_eq!(metrics, vec!["Total Rows", "Valid Emails", "Custom"]);
        assert_eq!(p.cards()[2].decoration, Decoration::default());
        assert_eq!(p.cards()[1].target, 98);
    }

    #[test]
    fn test_zero_and_large_counts_reveal() {
        let mut p = panel();
        let start = Instant::now();
        p.render(&result(&[("Total", 0), ("Final", 1500)]), "u".to_string(), start);

        let first = p.frames(start);
        assert!(first[0].visible);
        assert_eq!(first[0].value, 0);
        assert!(first[0].settled);
        assert!(!first[1].visible);
        assert!(p.is_animating(start));

        // Half-way through the second card's count.
        let mid = p.frames(start + Duration::from_millis(80 + 200 + 450));
        assert_eq!(mid[1].value, 1313);

        let end = start + Duration::from_millis(80 + 200 + 900);
        assert_eq!(p.frames(end)[1].value, 1500);
        assert!(!p.is_animating(end));
        assert_eq!(format_count(p.frames(end)[1].value), "1,500");
    }

    #[test]
    fn test_download_link_targets_uid() {
        let mut p = panel();
        let url = download_url("http://127.0.0.1:8000", "abc123");
        p.render(&result(&[("Total", 1)]), url, Instant::now());
        assert_eq!(p.download_url(), Some("http://127.0.0.1:8000/download/abc123"));
    }

    #[test]
    fn test_rerender_replaces_previous_cards() {
        let mut p = panel();
        let now = Instant::now();
        p.render(&result(&[("A", 1), ("B", 2)]), "u1".to_string(), now);
        p.render(&result(&[("C", 3)]), "u2".to_string(), now);
        assert_eq!(p.cards().len(), 1);
        assert_eq!(p.cards()[0].metric, "C");
        assert_eq!(p.download_url(), Some("u2"));
    }

    #[test]
    fn test_nothing_shown_before_render() {
        let p = panel();
        assert!(p.cards().is_empty());
        assert!(p.download_url().is_none());
        assert!(!p.is_animating(Instant::now()));
    }

    #[test]
    fn test_replay_restarts_from_zero() {
        let mut p = panel();
        let start = Instant::now();
        p.render(&result(&[("Final", 1500)]), "u".to_string(), start);
        let later = start + Duration::from_secs(5);
        assert!(!p.is_animating(later));
        p.replay(later);
        assert!(p.is_animating(later));
        assert_eq!(p.frames(later)[0].value, 0);
    }

    fn seven_cards(p: &mut ResultsPanel) {
        let stats: Vec<(String, u64)> = (1..=7).map(|i| (format!("M{}", i), i)).collect();
        let stats: Vec<(&str, u64)> = stats.iter().map(|(m, c)| (m.as_str(), *c)).collect();
        p.render(&result(&stats), "u".to_string(), Instant::now());
    }

    #[test]
    fn test_scroll_moves_by_rows_and_clamps() {
        let mut p = panel();
        seven_cards(&mut p);
        p.set_viewport(3, 1);
        assert_eq!(p.visible_cards(), 0..3);
        assert_eq!(p.hidden_below(), 4);

        p.scroll_by(1);
        assert_eq!(p.visible_cards(), 3..6);
        assert_eq!((p.hidden_above(), p.hidden_below()), (3, 1));

        p.scroll_by(5);
        assert_eq!(p.visible_cards(), 6..7);
        assert_eq!((p.hidden_above(), p.hidden_below()), (6, 0));

        p.scroll_by(-10);
        assert_eq!(p.visible_cards(), 0..3);
    }

    #[test]
    fn test_everything_fits_means_no_scrolling() {
        let mut p = panel();
        seven_cards(&mut p);
        p.set_viewport(4, 2);
        p.scroll_by(1);
        assert_eq!(p.visible_cards(), 0..7);
        assert_eq!((p.hidden_above(), p.hidden_below()), (0, 0));
    }

    #[test]
    fn test_render_resets_scroll() {
        let mut p = panel();
        seven_cards(&mut p);
        p.set_viewport(3, 1);
        p.scroll_by(2);
        seven_cards(&mut p);
        assert_eq!(p.visible_cards(), 0..3);
    }

    #[test]
    fn test_j_and_k_scroll_the_grid() {
        use ratatui::crossterm::event::KeyModifiers;

        let mut p = panel();
        let s = AppState::new("http://127.0.0.1:8000".to_string(), "/tmp".into());
        seven_cards(&mut p);
        p.set_viewport(3, 1);
        let actions = p.handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE), &s);
        assert!(actions.is_empty());
        assert_eq!(p.visible_cards(), 3..6);
        p.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE), &s);
        assert_eq!(p.visible_cards(), 6..7);
        p.handle_key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE), &s);
        assert_eq!(p.visible_cards(), 3..6);
    }

    #[test]
    fn test_overflow_marker_counts_cards_out_of_view() {
        use ratatui::{backend::TestBackend, crossterm::event::KeyModifiers, Terminal};

        let mut p = panel();
        let s = AppState::new("http://127.0.0.1:8000".to_string(), "/tmp".into());
        seven_cards(&mut p);
        let mut terminal = Terminal::new(TestBackend::new(80, 15)).unwrap();
        let screen = |terminal: &Terminal<TestBackend>| -> String {
            terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|c| c.symbol())
                .collect()
        };

        terminal
            .draw(|f| {
                let area = f.area();
                p.draw(f, area, &s)
            })
            .unwrap();
        assert_eq!(p.visible_cards(), 0..6);
        assert!(screen(&terminal).contains("↓ 1 more"));

        p.handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE), &s);
        terminal
            .draw(|f| {
                let area = f.area();
                p.draw(f, area, &s)
            })
            .unwrap();
        let text = screen(&terminal);
        assert!(text.contains("↑ 3 above"));
        assert!(!text.contains("more"));
    }

    #[test]
    fn test_truncate_to_width_counts_columns() {
        assert_eq!(truncate_to_width("Valid Emails", 20), "Valid Emails");
        assert_eq!(truncate_to_width("Valid Emails", 6), "Valid…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }
}
