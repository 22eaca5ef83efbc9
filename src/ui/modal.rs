// Modal UI components.
// Notices and the review form, drawn on top of the current view.

use ratatui::{prelude::*, widgets::*};

use crate::state::{FormField, ReviewDraft};

/// A rectangle of at most `width` x `height`, centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Draw a notice that stays until any key is pressed.
pub fn draw_notice(frame: &mut Frame, message: &str) {
    let modal_area = centered(frame.area(), 60, 7);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice ");

    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, modal_area);
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![Span::styled(label, label_style), Span::raw(value)];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

/// Draw the review form for `restaurant_name`.
pub fn draw_review_form(frame: &mut Frame, restaurant_name: &str, form: &ReviewDraft) {
    let modal_area = centered(frame.area(), 70, 13);
    frame.render_widget(Clear, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Name
            Constraint::Min(4),    // Comments
            Constraint::Length(3), // Rating
            Constraint::Length(1), // Instructions
        ])
        .split(modal_area);

    let title = format!(" Post review: {} ", restaurant_name);
    let name = Paragraph::new(field_line(
        "Name: ",
        form.name.clone(),
        form.field == FormField::Name,
    ))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    frame.render_widget(name, chunks[0]);

    let comments = Paragraph::new(field_line(
        "Review: ",
        form.comments.clone(),
        form.field == FormField::Comments,
    ))
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(comments, chunks[1]);

    let rating = Paragraph::new(field_line(
        "Rate restaurant: ",
        format!("{} ", form.rating_label()),
        form.field == FormField::Rating,
    ))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(rating, chunks[2]);

    let instructions = Line::from(vec![
        Span::styled(" Enter", Style::default().fg(Color::Yellow)),
        Span::styled(" = Send  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::styled(" = Next field  ", Style::default().fg(Color::DarkGray)),
        Span::styled("←→/1-5", Style::default().fg(Color::Yellow)),
        Span::styled(" = Rating  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(" = Cancel ", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(
        Paragraph::new(instructions).alignment(Alignment::Center),
        chunks[3],
    );
}
