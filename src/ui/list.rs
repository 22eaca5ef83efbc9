// List rendering for restaurants and reviews.
// Provides styled list views with loading, error, and empty states.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::api::{Restaurant, Review};
use crate::state::detail::NO_REVIEWS;
use crate::state::{LoadingState, SelectableList};

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Stars for a 1-5 rating.
pub fn rating_stars(rating: u8) -> String {
    let filled = rating.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

fn highlighted(list: List<'_>) -> List<'_> {
    list.highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ")
}

/// Render the restaurants list.
pub fn render_restaurants_list(
    frame: &mut Frame,
    list: &mut SelectableList<Restaurant>,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL).title(" Restaurants ");
    let inner = block.inner(area);

    match &list.data {
        LoadingState::Idle => {
            frame.render_widget(block, area);
            render_empty(frame, inner, "Press r to load");
        }
        LoadingState::Loading => {
            frame.render_widget(block, area);
            render_loading(frame, inner, "Loading restaurants");
        }
        LoadingState::Error(e) => {
            frame.render_widget(block, area);
            render_error(frame, inner, &format!("{} (press r to retry)", e));
        }
        LoadingState::Loaded(restaurants) => {
            if restaurants.is_empty() {
                frame.render_widget(block, area);
                render_empty(frame, inner, "No restaurants match these filters");
                return;
            }
            let items: Vec<ListItem> = restaurants
                .iter()
                .map(|restaurant| {
                    let favorite = if restaurant.is_favorite {
                        Span::styled("♥ ", Style::default().fg(Color::Red))
                    } else {
                        Span::styled("♡ ", Style::default().fg(Color::DarkGray))
                    };
                    ListItem::new(vec![
                        Line::from(vec![
                            favorite,
                            Span::styled(
                                restaurant.name.clone(),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!("  {}", restaurant.cuisine_type),
                                Style::default().fg(Color::Magenta),
                            ),
                        ]),
                        Line::from(Span::styled(
                            format!("  {} · {}", restaurant.neighborhood, restaurant.address),
                            Style::default().fg(Color::DarkGray),
                        )),
                    ])
                })
                .collect();

            let list_widget = highlighted(List::new(items).block(block));
            frame.render_stateful_widget(list_widget, area, &mut list.list_state);
        }
    }
}

/// Render the reviews of one restaurant, newest first.
pub fn render_reviews_list(
    frame: &mut Frame,
    list: &mut SelectableList<Review>,
    area: Rect,
    title: &str,
) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = block.inner(area);

    match &list.data {
        LoadingState::Idle | LoadingState::Loading => {
            frame.render_widget(block, area);
            render_loading(frame, inner, "Loading reviews");
        }
        LoadingState::Error(e) => {
            frame.render_widget(block, area);
            render_error(frame, inner, e);
        }
        LoadingState::Loaded(reviews) => {
            if reviews.is_empty() {
                frame.render_widget(block, area);
                render_empty(frame, inner, NO_REVIEWS);
                return;
            }
            let width = inner.width.saturating_sub(4).max(10) as usize;
            let items: Vec<ListItem> = reviews
                .iter()
                .map(|review| {
                    let mut lines = vec![
                        Line::from(vec![
                            Span::styled(
                                review.name.clone(),
                                Style::default()
                                    .fg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::raw("  "),
                            Span::styled(
                                rating_stars(review.rating),
                                Style::default().fg(Color::Yellow),
                            ),
                            Span::styled(
                                format!("  {}", review.display_date()),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]),
                    ];
                    lines.extend(
                        wrap_text(&review.comments, width)
                            .into_iter()
                            .map(|line| Line::from(format!("  {}", line))),
                    );
                    lines.push(Line::from(""));
                    ListItem::new(lines)
                })
                .collect();

            let list_widget = highlighted(List::new(items).block(block));
            frame.render_stateful_widget(list_widget, area, &mut list.list_state);
        }
    }
}

/// Greedy word wrap; list items do not wrap on their own.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
