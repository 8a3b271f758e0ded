use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use typemaster::metrics::{format_duration, rating};

use crate::{
    ui::{bold_style, dim_bold_style, italic_style, notice_style, HORIZONTAL_MARGIN, VERTICAL_MARGIN},
    App,
};

/// Final numbers of the completed test
pub struct ResultsView<'a>(pub &'a App);

fn rating_color(wpm: u32) -> Color {
    match wpm {
        60.. => Color::Green,
        40..=59 => Color::Yellow,
        _ => Color::Magenta,
    }
}

impl Widget for ResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let Some(result) = app.engine.result() else {
            Paragraph::new(Span::styled("no result yet", dim_bold_style()))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1), // wpm
                Constraint::Length(1), // rating
                Constraint::Length(1),
                Constraint::Length(1), // details
                Constraint::Length(1), // category
                Constraint::Length(1),
                Constraint::Length(1), // notice
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            format!("{} wpm", result.wpm),
            bold_style().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            rating(result.wpm),
            Style::default()
                .fg(rating_color(result.wpm))
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        Paragraph::new(Line::from(vec![
            Span::styled(format!("{}% acc", result.accuracy), bold_style()),
            Span::raw("   "),
            Span::styled(format_duration(result.duration), bold_style()),
            Span::raw("   "),
            Span::styled(format!("{} errors", result.errors), bold_style()),
            Span::raw("   "),
            Span::styled(
                format!("{}/{} chars", result.correct_chars, result.total_chars),
                bold_style(),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        Paragraph::new(Span::styled(result.category.clone(), dim_bold_style()))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        let notice = match (app.engine.save_error(), &app.notice) {
            (Some(e), _) => Some(format!("Result not saved: {e}")),
            (None, notice) => notice.clone(),
        };
        if let Some(notice) = notice {
            Paragraph::new(Span::styled(notice, notice_style()))
                .alignment(Alignment::Center)
                .render(chunks[7], buf);
        }

        Paragraph::new(Span::styled(
            "(r)etry / (s)etup / (h)istory / (q)uit",
            italic_style(),
        ))
        .render(chunks[9], buf);
    }
}
