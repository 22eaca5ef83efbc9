// Tab bar.
// Restaurants shows how many entries are listed, Console how many problems are unread.
// Queued offline reviews are flagged on the right of the bar.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

const TABS: [Tab; 2] = [Tab::Restaurants, Tab::Console];

fn tab_label(app: &App, tab: Tab) -> (String, Style) {
    let base = if tab == app.active_tab {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    match tab {
        Tab::Restaurants => match app.restaurants.restaurants.data.data() {
            Some(list) => (format!("{} [{}]", tab.title(), list.len()), base),
            None => (tab.title().to_string(), base),
        },
        Tab::Console if app.console.unread > 0 => {
            let label = format!("{} ({})", tab.title(), app.console.unread);
            if tab == app.active_tab {
                (label, base)
            } else {
                (label, Style::default().fg(Color::Red))
            }
        }
        Tab::Console => (tab.title().to_string(), base),
    }
}

/// Draw the tab bar at the top of the screen.
pub fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = TABS
        .iter()
        .map(|tab| {
            let (label, style) = tab_label(app, *tab);
            Line::from(Span::styled(label, style))
        })
        .collect();
    let selected = TABS.iter().position(|t| *t == app.active_tab).unwrap_or(0);

    let mut block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Restaurant Reviews ")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let queued = app.queued_reviews();
    if queued > 0 {
        let noun = if queued == 1 { "review" } else { "reviews" };
        block = block.title(
            Line::from(Span::styled(
                format!(" {} {} waiting for connection ", queued, noun),
                Style::default().fg(Color::Yellow),
            ))
            .right_aligned(),
        );
    }

    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" · "));

    frame.render_widget(tabs, area);
}
