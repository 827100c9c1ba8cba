//! PaneChrome — bordered section block with highlight styling and a badge.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders},
};

use crate::theme::{style_active_border, style_inactive_border, C_MUTED, C_PRIMARY};

/// A badge shown in the top-right of the section header (e.g. "UPLOADING").
pub struct Badge<'a> {
    pub text: &'a str,
    pub color: Color,
}

/// Bordered block for a workflow section.  `active` switches to the
/// highlighted border (used for the drop-target indication); `dimmed` draws
/// a section that is on its way out.
pub fn pane_chrome<'a>(title: &'a str, active: bool, dimmed: bool, badge: Option<Badge<'a>>) -> Block<'a> {
    let border_style = if active {
        style_active_border()
    } else {
        style_inactive_border()
    };
    let title_style = if dimmed {
        Style::default().fg(C_MUTED)
    } else {
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if active {
            BorderType::Thick
        } else {
            BorderType::Rounded
        })
        .border_style(border_style)
        .title(Line::from(Span::styled(format!(" {} ", title), title_style)));

    match badge {
        Some(b) => block.title_top(
            Line::from(Span::styled(
                format!(" {} ", b.text),
                Style::default().fg(b.color).add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        ),
        None => block,
    }
}
