// Restaurant detail rendering.
// Info panel with operating hours next to the reviews list.

use ratatui::{prelude::*, widgets::*};

use crate::data::{Origin, image_url_for_restaurant, url_for_restaurant};
use crate::state::RestaurantDetailState;

use super::list;

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

/// Draw the restaurant view.
pub fn draw_restaurant(frame: &mut Frame, detail: &mut RestaurantDetailState, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    draw_info(frame, detail, columns[0]);

    let mut title = " Reviews ".to_string();
    if detail.reviews_origin == Some(Origin::Cache) {
        title = " Reviews (offline copy) ".to_string();
    }
    if detail.pending {
        title.push_str("[review queued] ");
    }
    list::render_reviews_list(frame, &mut detail.reviews, columns[1], &title);
}

fn draw_info(frame: &mut Frame, detail: &RestaurantDetailState, area: Rect) {
    let restaurant = &detail.restaurant;
    let favorite = if restaurant.is_favorite {
        Span::styled("♥ favorite", Style::default().fg(Color::Red))
    } else {
        Span::styled("♡ not a favorite", Style::default().fg(Color::DarkGray))
    };
    let image_status = match detail.image_cached {
        Some(true) => Span::styled(" (cached)", Style::default().fg(Color::Green)),
        Some(false) => Span::styled(" (not cached)", Style::default().fg(Color::Yellow)),
        None => Span::raw(""),
    };
    let location = match &restaurant.latlng {
        Some(latlng) => format!("{:.5}, {:.5}", latlng.lat, latlng.lng),
        None => "unknown".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            restaurant.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(favorite),
        Line::from(""),
        Line::from(vec![label("Cuisine:  "), Span::raw(restaurant.cuisine_type.clone())]),
        Line::from(vec![label("Address:  "), Span::raw(restaurant.address.clone())]),
        Line::from(vec![label("Area:     "), Span::raw(restaurant.neighborhood.clone())]),
        Line::from(vec![label("Location: "), Span::raw(location)]),
        Line::from(vec![label("Link:     "), Span::raw(url_for_restaurant(restaurant))]),
        Line::from(vec![
            label("Photo:    "),
            Span::raw(image_url_for_restaurant(restaurant)),
            image_status,
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Operating hours",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    let hours = restaurant.ordered_hours();
    if hours.is_empty() {
        lines.push(Line::from(label("  not listed")));
    }
    for (day, time) in hours {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<10}", day), Style::default().fg(Color::Yellow)),
            Span::raw(time.to_string()),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Restaurant "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
