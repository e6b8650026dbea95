//! Object list and body details

use super::{bar, section, stat_line, state_color};
use crate::app::App;
use damage_core::object::AiState;
use damage_core::GameObject;
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
        .constraints([Constraint::Min(50), Constraint::Length(48)])
        .split(area);

    draw_list(f, app, chunks[0]);
    draw_details(f, app, chunks[1]);
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .world
        .objects()
        .enumerate()
        .map(|(i, o)| {
            let status = o.body.status();
            let selected = i == app.selected_object;
            let marker = if selected { "▶ " } else { "  " };
            let name_style = if !o.is_alive() {
                Style::default().fg(Color::DarkGray)
            } else if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("{:<5}", o.id().to_string()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:<12}", o.template.name), name_style),
                Span::styled(
                    format!("{:<5}", app.player_name(o.state.owner)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    bar(status.current_health, status.max_health, 12),
                    Style::default().fg(state_color(status.damage_state)),
                ),
                Span::styled(
                    format!(" {:>6.0}/{:<6.0}", status.current_health, status.max_health),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(flags(o), Style::default().fg(Color::Magenta)),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Objects "));
    f.render_widget(list, area);
}

/// Short markers for the conditions worth seeing at a glance
fn flags(object: &GameObject) -> String {
    let mut out = String::new();
    if !object.is_alive() {
        out.push_str(" DEAD");
    }
    if object.body.status().subdued {
        out.push_str(" SUBDUED");
    }
    if object.body.status().chrono_disabled {
        out.push_str(" CHRONO");
    }
    if !object.state.disabled.is_empty() && !out.contains("SUBDUED") && !out.contains("CHRONO") {
        out.push_str(" DISABLED");
    }
    if let AiState::Attacking(target) = object.state.ai {
        out.push_str(&format!(" →{}", target));
    }
    out
}

fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let Some(object) = app.selected() else {
        let empty = Paragraph::new("No object selected")
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        f.render_widget(empty, area);
        return;
    };
    let status = object.body.status();

    let mut lines = vec![
        section("Body"),
        stat_line("Health", format!("{:.1} / {:.1}", status.current_health, status.max_health)),
        Line::from(vec![
            Span::styled(format!("{:20}", "State"), Style::default().fg(Color::Gray)),
            Span::styled(
                status.damage_state.name(),
                Style::default().fg(state_color(status.damage_state)),
            ),
        ]),
        stat_line(
            "Subdual",
            format!(
                "{:.0} / {:.0}{}",
                status.subdual_damage,
                status.subdual_cap,
                if status.subdued { " (subdued)" } else { "" }
            ),
        ),
        stat_line("Chrono", format!("{:.0}", status.chrono_damage)),
        stat_line("Particle systems", object.body.particle_systems().len().to_string()),
        Line::from(""),
        section("Object"),
        stat_line("Owner", app.player_name(object.state.owner).to_string()),
        stat_line("Veterancy", format!("{:?} ({} xp)", object.veterancy, object.experience)),
        stat_line("AI", format!("{:?}", object.state.ai)),
        stat_line("Status", list_or_dash(object.state.status.iter().map(|s| format!("{:?}", s)))),
        stat_line(
            "Disabled",
            list_or_dash(object.state.disabled.keys().map(|d| format!("{:?}", d))),
        ),
        stat_line(
            "Armor flags",
            list_or_dash(object.state.armor_set_flags.iter().map(|a| format!("{:?}", a))),
        ),
    ];

    if let Some(contain) = &object.state.contain {
        lines.push(stat_line(
            "Contains",
            list_or_dash(contain.passengers.iter().map(|p| p.to_string())),
        ));
    }

    if let Some(last) = object.body.last_damage() {
        lines.push(Line::from(""));
        lines.push(section("Last damage"));
        lines.push(stat_line(
            "Hit",
            format!("{:.1} {} @ {}", last.amount, last.damage_type.name(), last.frame),
        ));
        lines.push(stat_line(
            "From",
            last.source_id.map_or("-".to_string(), |id| id.to_string()),
        ));
    }

    lines.push(Line::from(""));
    lines.push(section("Modules"));
    for module in object.modules.damage_modules() {
        lines.push(Line::from(Span::styled(
            format!("  {}", module.summary()),
            Style::default().fg(Color::White),
        )));
    }
    for module in object.modules.upgrade_modules() {
        lines.push(Line::from(Span::styled(
            format!("  {}", module.summary()),
            Style::default().fg(Color::Green),
        )));
    }

    let title = format!(" {} {} ", object.template.name, object.id());
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

pub fn list_or_dash(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
