//! Smooth Unicode progress bar widget.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_SECONDARY, C_SUCCESS};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Render a byte-transfer progress bar in `area`.
/// Without a known `total` the bar stays empty and only the count is shown.
pub fn draw_progress(frame: &mut Frame, area: Rect, received: u64, total: Option<u64>) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let progress = match total {
        Some(t) if t > 0 => received as f64 / t as f64,
        _ => 0.0,
    };
    let left_label = fmt_bytes(received);
    let right_label = total.map(fmt_bytes).unwrap_or_default();
    let label_w = (left_label.len() + right_label.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let mut spans = vec![Span::styled(
        format!("{} ", left_label),
        Style::default().fg(C_SECONDARY),
    )];
    spans.push(Span::styled(bar(progress, bar_w), Style::default().fg(C_SUCCESS)));
    if !right_label.is_empty() {
        spans.push(Span::styled(
            format!(" {}", right_label),
            Style::default().fg(C_MUTED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// `width` cells filled to `progress` (0.0..=1.0) in eighth-cell steps.
fn bar(progress: f64, width: usize) -> String {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut out = String::with_capacity(width + 4);
    for _ in 0..full_blocks {
        out.push('█');
    }
    if full_blocks < width {
        out.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            out.push(' ');
        }
    }
    out
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_is_stable() {
        for p in [0.0, 0.13, 0.5, 0.999, 1.0] {
            assert_eq!(bar(p, 10).chars().count(), 10, "progress {}", p);
        }
        assert_eq!(bar(1.0, 4), "████");
        assert_eq!(bar(0.5, 4), "██  ");
    }

    #[test]
    fn test_fmt_bytes() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
