// UI module for rendering the TUI.
// Contains widgets for tabs, breadcrumbs, the restaurant list and detail, and modals.

mod breadcrumb;
mod detail;
mod list;
mod modal;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};
use crate::data::Origin;
use crate::state::{ConsoleLevel, ViewLevel};

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Length(2), // Breadcrumb
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);

    match app.active_tab {
        Tab::Restaurants => {
            let breadcrumbs = app.restaurants.nav.breadcrumbs();
            let status = match app.restaurants.origin {
                Some(Origin::Cache) => Some(("offline copy ", Color::Yellow)),
                Some(Origin::Network) => Some(("online ", Color::Green)),
                None => None,
            };
            breadcrumb::draw_breadcrumb(frame, &breadcrumbs, chunks[1], status);
        }
        Tab::Console => {
            let block = Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray));
            frame.render_widget(block, chunks[1]);
        }
    }

    draw_content(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    if let Some(detail) = &app.restaurants.detail {
        if detail.editing && app.active_tab == Tab::Restaurants {
            modal::draw_review_form(frame, &detail.restaurant.name, &detail.form);
        }
    }

    // Help overlay and notices are rendered last, on top of everything
    if app.show_help {
        draw_help_overlay(frame);
    }
    if let Some(notice) = &app.notice {
        modal::draw_notice(frame, notice);
    }
}

/// Draw the main content area based on active tab.
fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.active_tab {
        Tab::Restaurants => draw_restaurants_tab(frame, app, area),
        Tab::Console => draw_console_tab(frame, app, area),
    }
}

/// Draw the Restaurants tab for the current navigation level.
fn draw_restaurants_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let state = &mut app.restaurants;
    match state.nav.current() {
        ViewLevel::Restaurants => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(area);

            let key = Style::default().fg(Color::Yellow);
            let filters = Line::from(vec![
                Span::styled(" Neighborhood: ", Style::default().fg(Color::DarkGray)),
                Span::styled(state.neighborhoods.label().to_string(), key),
                Span::styled(" (n/N)   Cuisine: ", Style::default().fg(Color::DarkGray)),
                Span::styled(state.cuisines.label().to_string(), key),
                Span::styled(" (c/C)", Style::default().fg(Color::DarkGray)),
            ]);
            frame.render_widget(Paragraph::new(filters), chunks[0]);
            list::render_restaurants_list(frame, &mut state.restaurants, chunks[1]);
        }
        ViewLevel::Restaurant { .. } => match &mut state.detail {
            Some(detail) => detail::draw_restaurant(frame, detail, area),
            None => list::render_loading(frame, area, "Loading restaurant"),
        },
    }
}

/// Draw the Console tab with notices and problems, newest first.
fn draw_console_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Console ");

    if app.console.messages.is_empty() {
        let text = Paragraph::new("No messages")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = app
        .console
        .messages
        .iter()
        .rev()
        .map(|msg| {
            let (icon, color) = match msg.level {
                ConsoleLevel::Error => ("❌", Color::Red),
                ConsoleLevel::Warn => ("⚠️", Color::Yellow),
                ConsoleLevel::Info => ("ℹ️", Color::Cyan),
            };

            let time = list::format_relative_time(&msg.timestamp);

            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", icon)),
                Span::styled(time, Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(msg.message.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list_widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list_widget, area, &mut app.console.list_state);
}

fn hint<'a>(key: &'a str, action: &'a str) -> [Span<'a>; 2] {
    [
        Span::raw(key),
        Span::styled(action, Style::default().fg(Color::DarkGray)),
    ]
}

/// Draw the status bar with keybinding hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<[Span; 2]> = if app.is_editing() {
        vec![
            hint(" Tab ", "Field"),
            hint("  ↵ ", "Send"),
            hint("  Esc ", "Cancel"),
        ]
    } else if app.active_tab == Tab::Console {
        vec![
            hint(" ↑↓ ", "Scroll"),
            hint("  Tab ", "Switch"),
            hint("  q ", "Quit"),
        ]
    } else {
        match app.restaurants.current_view() {
            ViewLevel::Restaurants => vec![
                hint(" ↑↓ ", "Navigate"),
                hint("  ↵ ", "Open"),
                hint("  f ", "Favorite"),
                hint("  n/c ", "Filter"),
                hint("  r ", "Refresh"),
                hint("  Tab ", "Switch"),
                hint("  ? ", "Help"),
                hint("  q ", "Quit"),
            ],
            ViewLevel::Restaurant { .. } => vec![
                hint(" ↑↓ ", "Reviews"),
                hint("  w ", "Write review"),
                hint("  f ", "Favorite"),
                hint("  r ", "Refresh"),
                hint("  Esc ", "Back"),
                hint("  ? ", "Help"),
                hint("  q ", "Quit"),
            ],
        }
    };

    let spans: Vec<Span> = hints.into_iter().flatten().collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 55.min(area.width);
    let popup_height = 19.min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let shortcuts = [
        ("  ↑/↓ or j/k    ", "Navigate list"),
        ("  Enter         ", "Open restaurant / write review"),
        ("  Esc           ", "Go back / close help"),
        ("  Tab           ", "Switch tabs"),
        ("  n / N         ", "Next / previous neighborhood"),
        ("  c / C         ", "Next / previous cuisine"),
        ("  f             ", "Toggle favorite"),
        ("  w             ", "Write a review"),
        ("  r             ", "Refresh current view"),
        ("  ?             ", "Show/hide this help"),
        ("  q             ", "Quit"),
    ];

    let mut help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];
    help_text.extend(shortcuts.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(*key, Style::default().fg(Color::Cyan)),
            Span::raw(*action),
        ])
    }));
    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::styled("Press ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(" or ", Style::default().fg(Color::DarkGray)),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::styled(" to close", Style::default().fg(Color::DarkGray)),
    ]));

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
