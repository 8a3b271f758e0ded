use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget},
};

use typemaster::{
    metrics::format_duration, results, time_series::wpm_trend, ResultsStore, TestResult,
};

use crate::{
    ui::{
        bold_style,
        charting::{compute_chart_params, format_label},
        dim_bold_style, italic_style, HORIZONTAL_MARGIN, VERTICAL_MARGIN,
    },
    App,
};

/// Rows listed under the chart
const RECENT_LIMIT: usize = 10;
/// Attempts plotted on the trend chart
const TREND_WINDOW: usize = 50;

/// Aggregates, trend and recent results from the store
pub struct HistoryView<'a>(pub &'a App);

fn present_row(result: &TestResult) -> Row<'static> {
    Row::new(vec![
        Cell::from(result.date.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(result.wpm.to_string()).style(bold_style()),
        Cell::from(format!("{}%", result.accuracy)),
        Cell::from(format_duration(result.duration)),
        Cell::from(result.category.clone()),
    ])
}

fn render_trend(log: &[TestResult], area: Rect, buf: &mut Buffer) {
    let trend = wpm_trend(log, TREND_WINDOW);
    let ([first, last], highest_wpm) = compute_chart_params(&trend);
    let coords: Vec<(f64, f64)> = trend.into_iter().map(Into::into).collect();

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&coords)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("test")
                .bounds([first, last])
                .labels(vec![
                    Span::styled(format_label(first), bold_style()),
                    Span::styled(format_label(last), bold_style()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style()),
                    Span::styled(format_label(highest_wpm), bold_style()),
                ]),
        )
        .render(area, buf);
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let log = self.0.engine.store().all();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // summary
                Constraint::Min(6),    // trend
                Constraint::Length(RECENT_LIMIT as u16 + 3),
                Constraint::Length(1), // legend
            ])
            .split(area);

        let summary = format!(
            "Average {} wpm   Best {} wpm   Total {} tests",
            results::average_wpm(&log),
            results::best_wpm(&log),
            log.len()
        );
        Paragraph::new(summary)
            .block(Block::default().borders(Borders::ALL).title("History"))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        if log.is_empty() {
            Paragraph::new("No tests completed yet.\nFinish a test to start your history!")
                .style(dim_bold_style())
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
        } else {
            render_trend(&log, chunks[1], buf);

            let rows: Vec<Row> = log
                .iter()
                .rev()
                .take(RECENT_LIMIT)
                .map(present_row)
                .collect();
            let header = Row::new(vec!["Date", "WPM", "Accuracy", "Time", "Category"]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            Table::new(
                rows,
                [
                    Constraint::Length(18),
                    Constraint::Length(6),
                    Constraint::Length(10),
                    Constraint::Length(6),
                    Constraint::Min(10),
                ],
            )
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Recent"))
            .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled("(b)ack / (q)uit", italic_style())).render(chunks[3], buf);
    }
}
