//! Upgrade grants and module activation

use super::section;
use crate::app::App;
use damage_core::upgrade::UpgradeKind;
use damage_core::UpgradeMask;
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
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_upgrades(f, app, chunks[0]);
    draw_modules(f, app, chunks[1]);
}

fn draw_upgrades(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.selected();
    let object_mask = selected.map_or(UpgradeMask::EMPTY, |o| o.upgrades);
    let player_mask = selected
        .and_then(|o| o.state.owner)
        .and_then(|p| app.world.players().get(p))
        .map_or(UpgradeMask::EMPTY, |p| p.upgrades);

    let items: Vec<ListItem> = app
        .world
        .data()
        .upgrades
        .templates()
        .enumerate()
        .map(|(i, template)| {
            let (kind, owned) = match template.kind {
                UpgradeKind::Player => ("player", player_mask.test_for_any(template.mask)),
                UpgradeKind::Object => ("object", object_mask.test_for_any(template.mask)),
            };
            let style = if i == app.selected_upgrade {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if owned {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::raw(if i == app.selected_upgrade { "▶ " } else { "  " }),
                Span::styled(format!("{:<26}", template.name), style),
                Span::styled(format!("{:<8}", kind), Style::default().fg(Color::DarkGray)),
                Span::styled(if owned { "✔" } else { "" }, Style::default().fg(Color::Green)),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Upgrades "));
    f.render_widget(list, area);
}

fn draw_modules(f: &mut Frame, app: &App, area: Rect) {
    let Some(object) = app.selected() else {
        let empty = Paragraph::new("No object selected")
            .block(Block::default().borders(Borders::ALL).title(" Modules "));
        f.render_widget(empty, area);
        return;
    };

    let mut lines = vec![section("Upgrade modules")];
    if object.modules.upgrade_modules().next().is_none() {
        lines.push(Line::from(Span::styled("  none", Style::default().fg(Color::DarkGray))));
    }
    for module in object.modules.upgrade_modules() {
        let upgrades = &app.world.data().upgrades;
        let masks = module.activation().masks();
        let executed = module.activation().is_already_upgraded();
        lines.push(Line::from(Span::styled(
            format!("  {}", module.summary()),
            Style::default().fg(if executed { Color::Green } else { Color::White }),
        )));
        lines.push(Line::from(Span::styled(
            format!("    triggered by {}", upgrades.names_in(masks.activation).join(", ")),
            Style::default().fg(Color::DarkGray),
        )));
        if masks.conflicting.any() {
            lines.push(Line::from(Span::styled(
                format!("    conflicts with {}", upgrades.names_in(masks.conflicting).join(", ")),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(section("Damage modules"));
    for module in object.modules.damage_modules() {
        lines.push(Line::from(format!("  {}", module.summary())));
    }

    let title = format!(" {} {} ", object.template.name, object.id());
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}
