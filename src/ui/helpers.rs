use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Medicine, MISSING};

/// Format a parsed price as rupees, or fall back to `missing`.
pub(crate) fn price_label(price: Option<f64>, missing: &str) -> String {
    match price {
        Some(price) => format!("₹{price}"),
        None => missing.to_string(),
    }
}

/// Card body for a medicine in result and saved lists.
pub(crate) fn medicine_card_lines(medicine: &Medicine, selected: bool) -> Vec<Line<'static>> {
    let title = if selected {
        format!("▶ {}", medicine.name)
    } else {
        medicine.name.clone()
    };

    let summary = medicine.composition_summary();
    let summary = if summary.is_empty() {
        MISSING.to_string()
    } else {
        summary
    };

    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(summary, Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::styled(
                format!(
                    "{}  {}  ",
                    medicine.manufacturer().unwrap_or(MISSING),
                    medicine.pack_label()
                ),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                price_label(medicine.parsed_price(), "price n/a"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    if medicine.is_discontinued() {
        lines.push(Line::from(Span::styled(
            "Discontinued",
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
