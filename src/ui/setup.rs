use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{
    ui::{bold_style, dim_bold_style, italic_style, notice_style, HORIZONTAL_MARGIN, VERTICAL_MARGIN},
    App, SetupField,
};

/// Duration and category pickers shown before a test
pub struct SetupView<'a>(pub &'a App);

fn option_line(label: &str, value: &str, selected: bool) -> Line<'static> {
    let value_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        bold_style()
    };
    Line::from(vec![
        Span::styled(format!("{label:>10}  "), dim_bold_style()),
        Span::styled(format!("< {value} >"), value_style),
    ])
}

impl Widget for SetupView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let form = &app.setup;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Length(1),
                Constraint::Length(4), // options
                Constraint::Length(1), // notice
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new("typemaster")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let options = vec![
            option_line(
                "Duration",
                &form.duration().to_string(),
                form.field == SetupField::Duration,
            ),
            Line::default(),
            option_line(
                "Category",
                form.category(),
                form.field == SetupField::Category,
            ),
            Line::from(Span::styled(
                format!("{:>10}  {}", "Language", app.engine.settings().language),
                dim_bold_style(),
            )),
        ];
        Paragraph::new(options)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        if let Some(notice) = &app.notice {
            Paragraph::new(Span::styled(notice.clone(), notice_style()))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            "(↑/↓) field / (←/→) change / (enter) start / (h)istory / (q)uit",
            italic_style(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
    }
}
