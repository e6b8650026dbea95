//! Combat log view

use super::{bar, section, stat_line, state_color};
use crate::app::App;
use damage_core::DamageType;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(50),    // Main combat area
            Constraint::Length(38), // Damage preview panel
        ])
        .split(area);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Target bar
            Constraint::Min(0),    // Combat log
        ])
        .split(chunks[0]);

    draw_target_bar(f, app, main_chunks[0]);
    draw_log(f, app, main_chunks[1]);
    draw_preview(f, app, chunks[1]);
}

fn draw_target_bar(f: &mut Frame, app: &App, area: Rect) {
    let lines = match app.selected() {
        Some(target) => {
            let status = target.body.status();
            let color = state_color(status.damage_state);
            let width = area.width.saturating_sub(4) as usize;
            vec![
                Line::from(vec![
                    Span::styled("Target: ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        format!("{} {}", target.template.name, target.id()),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {:.0}/{:.0}", status.current_health, status.max_health),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" ({})", status.damage_state.name()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
                Line::from(Span::styled(
                    bar(status.current_health, status.max_health, width),
                    Style::default().fg(color),
                )),
                Line::from(vec![
                    Span::styled("Weapon: ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        format!("{:.0} {}", app.amount, app.damage_type().name()),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
            ]
        }
        None => vec![Line::from("No target")],
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Combat Status "));
    f.render_widget(paragraph, area);
}

fn draw_log(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .log
        .iter()
        .skip(app.log_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|line| {
            let style = if line.starts_with("━━━") {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if line.contains("destroyed") {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else if line.contains("Damage dealt") {
                Style::default().fg(Color::Green)
            } else if line.contains("subdued")
                || line.contains("chrono")
                || line.contains("disabled")
            {
                Style::default().fg(Color::Magenta)
            } else if line.contains("no effect") {
                Style::default().fg(Color::DarkGray)
            } else if line.contains("veteran") || line.contains("upgrade") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(line.clone(), style)))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Event Log "));
    f.render_widget(list, area);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![section("Damage type")];

    // A window of damage types around the selection
    let count = DamageType::ALL.len();
    for offset in 0..7 {
        let index = (app.selected_damage + count + offset - 3) % count;
        let style = if offset == 3 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let marker = if offset == 3 { "▶ " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, DamageType::ALL[index].name()),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(section("Preview"));
    match &app.preview {
        Some(preview) => {
            lines.push(stat_line("Estimate", format!("{:.1}", preview.estimate)));
            match &preview.simulation {
                Some(sim) => {
                    lines.push(stat_line("Hits (1/sec)", sim.hits.to_string()));
                    lines.push(stat_line("Avg per hit", format!("{:.1}", sim.avg_damage())));
                    lines.push(stat_line("DPS", format!("{:.1}", sim.dps())));
                    lines.push(stat_line(
                        "Time to kill",
                        sim.time_to_kill().map_or("never".to_string(), |t| format!("{:.1}s", t)),
                    ));
                }
                None => lines.push(Line::from(Span::styled(
                    "  no enemy attacker",
                    Style::default().fg(Color::DarkGray),
                ))),
            }
        }
        None => lines.push(Line::from("  -")),
    }

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Weapon "));
    f.render_widget(paragraph, area);
}
