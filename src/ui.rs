pub mod charting;
pub mod history;
pub mod results;
pub mod screen;
pub mod setup;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typemaster::{metrics::format_duration, CharOutcome, SessionStatus};

use crate::App;

pub(crate) const HORIZONTAL_MARGIN: u16 = 5;
pub(crate) const VERTICAL_MARGIN: u16 = 2;

pub(crate) fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

pub(crate) fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

pub(crate) fn notice_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::ITALIC)
}

/// Spans for the passage, one per character, styled by outcome
fn passage_spans(text: &str, chars: &[CharOutcome]) -> Vec<Span<'static>> {
    let green_bold_style = bold_style().fg(Color::Green);
    let red_bold_style = bold_style().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold_style().add_modifier(Modifier::UNDERLINED);

    text.chars()
        .zip(chars)
        .map(|(expected, outcome)| match outcome {
            CharOutcome::Correct => Span::styled(expected.to_string(), green_bold_style),
            CharOutcome::Incorrect(typed) => Span::styled(
                match typed {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            CharOutcome::Current => Span::styled(expected.to_string(), underlined_dim_bold_style),
            CharOutcome::Pending => Span::styled(expected.to_string(), dim_bold_style()),
        })
        .collect()
}

/// The typing screen
impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let live = self.engine.live();
        let passage = self.engine.session().passage();

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_occupied_lines = if passage.text.width() <= max_chars_per_line as usize {
            1
        } else {
            ((passage.text.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
        };
        let padding = area.height.saturating_sub(prompt_occupied_lines + 5) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding),
                Constraint::Length(2), // live stats
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
                Constraint::Length(1), // notice
                Constraint::Min(0),
            ])
            .split(area);

        let stats = Paragraph::new(Span::styled(
            format!(
                "{}   {} wpm   {}% acc   {} errors",
                format_duration(live.time_remaining),
                live.wpm,
                live.accuracy,
                live.errors
            ),
            dim_bold_style(),
        ))
        .alignment(Alignment::Center);
        stats.render(chunks[1], buf);

        let widget = Paragraph::new(Line::from(passage_spans(&passage.text, &live.chars)))
            .alignment(if prompt_occupied_lines == 1 {
                // a prompt that fits on one line reads best centered
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true });
        widget.render(chunks[2], buf);

        let legend = match live.status {
            SessionStatus::Idle => Span::styled("press enter to start".to_string(), notice_style()),
            _ => Span::styled(
                format!(
                    "{} / {}   (esc) finish early",
                    self.engine.settings().category,
                    passage.difficulty
                ),
                italic_style(),
            ),
        };
        Paragraph::new(legend)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(notice.clone(), notice_style()))
                .alignment(Alignment::Center)
                .render(chunks[5], buf);
        }
    }
}
