//! UI rendering

mod combat_view;
mod help_view;
mod power_view;
mod units_view;
mod upgrades_view;

use crate::app::{App, Tab};
use damage_core::BodyDamageType;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Keybindings footer
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);

    match app.current_tab {
        Tab::Units => units_view::draw(f, app, chunks[1]),
        Tab::Combat => combat_view::draw(f, app, chunks[1]),
        Tab::Power => power_view::draw(f, app, chunks[1]),
        Tab::Upgrades => upgrades_view::draw(f, app, chunks[1]),
        Tab::Help => help_view::draw(f, app, chunks[1]),
    }

    draw_keybindings(f, app, chunks[2]);
}

fn draw_keybindings(f: &mut Frame, app: &App, area: Rect) {
    let run_label = if app.paused { "Run" } else { "Pause" };
    let common_keys = vec![("Tab", "Next tab"), ("p", run_label), ("q", "Quit")];

    let tab_keys: Vec<(&str, &str)> = match app.current_tab {
        Tab::Units => vec![("↑/↓", "Select"), ("a", "Attack"), ("H", "Heal"), ("t", "+1 sec")],
        Tab::Combat => vec![
            ("↑/↓", "Target"),
            ("←/→", "Damage type"),
            ("+/-", "Amount"),
            ("a/Space", "Fire"),
            ("r", "Reset"),
        ],
        Tab::Power => vec![
            ("↑/↓", "Player"),
            ("s/Enter", "Sabotage"),
            ("x", "Steal"),
            ("t", "+1 sec"),
        ],
        Tab::Upgrades => vec![
            ("↑/↓", "Upgrade"),
            ("←/→", "Object"),
            ("Enter", "Grant"),
            ("w", "Snapshot"),
        ],
        Tab::Help => vec![],
    };

    let mut spans: Vec<Span> = Vec::new();

    for (i, (key, desc)) in tab_keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  │  ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            format!("[{}]", key),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {}", desc), Style::default().fg(Color::White)));
    }

    if !tab_keys.is_empty() {
        spans.push(Span::styled("  │  ", Style::default().fg(Color::DarkGray)));
    }

    for (i, (key, desc)) in common_keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  │  ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(format!("[{}]", key), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(format!(" {}", desc), Style::default().fg(Color::Gray)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Keys "))
        .alignment(ratatui::layout::Alignment::Center);

    f.render_widget(paragraph, area);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|t| {
            let style = if *t == app.current_tab {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(t.name(), style))
        })
        .collect();

    let title = format!(
        " Damage Sandbox  frame {}{} ",
        app.world.frame(),
        if app.paused { " (paused)" } else { "" }
    );
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider("|");

    f.render_widget(tabs, area);
}

/// Text bar of `width` cells filled to `current / max`
pub fn bar(current: f64, max: f64, width: usize) -> String {
    let percent = if max > 0.0 { (current / max).clamp(0.0, 1.0) } else { 0.0 };
    let filled = (percent * width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn state_color(state: BodyDamageType) -> Color {
    match state {
        BodyDamageType::Pristine => Color::Green,
        BodyDamageType::Damaged => Color::Yellow,
        BodyDamageType::ReallyDamaged => Color::Red,
        BodyDamageType::Rubble => Color::DarkGray,
    }
}

pub fn stat_line(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:20}", name), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

pub fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("── {} ──", title),
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_clamps() {
        assert_eq!(bar(5.0, 10.0, 4), "██░░");
        assert_eq!(bar(20.0, 10.0, 3), "███");
        assert_eq!(bar(1.0, 0.0, 2), "░░");
    }
}
