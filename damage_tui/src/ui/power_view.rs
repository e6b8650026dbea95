//! Per-player energy ledgers

use super::{bar, section, stat_line};
use crate::app::App;
use damage_core::energy::GrantSource;
use damage_core::Player;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (slot, player) in app.players.iter().enumerate() {
        if let Some(player) = app.world.players().get(*player) {
            draw_player(f, app, player, slot == app.selected_player, chunks[slot]);
        }
    }
}

fn draw_player(f: &mut Frame, app: &App, player: &Player, focused: bool, area: Rect) {
    let frame = app.world.frame();
    let energy = &player.energy;
    let production = energy.get_production(frame);
    let consumption = energy.get_consumption();
    let ok = energy.has_sufficient_power(frame);
    let color = if ok { Color::Green } else { Color::Red };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{:20}", "Power"), Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} / {}", production, consumption),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                if ok { "" } else { "  BROWNOUT" },
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            bar(
                consumption as f64,
                production.max(consumption) as f64,
                area.width.saturating_sub(4) as usize,
            ),
            Style::default().fg(color),
        )),
        stat_line("Supply ratio", format!("{:.2}", energy.get_energy_supply_ratio(frame))),
        Line::from(""),
        section("Breakdown"),
        stat_line("Plants", energy.base_production().to_string()),
        stat_line("Upgrade bonus", energy.bonus().to_string()),
        stat_line("Transfers", format!("{:+}", energy.transfer_balance())),
        stat_line("Transferable", energy.transferable_power(frame).to_string()),
    ];

    lines.push(Line::from(""));
    lines.push(section("Sabotage"));
    if energy.is_power_sabotaged(frame) {
        lines.push(Line::from(Span::styled(
            "  blackout in effect",
            Style::default().fg(Color::Red),
        )));
    }
    for entry in energy.sabotage_entries().iter().filter(|e| e.is_live(frame)) {
        lines.push(stat_line(
            "  partial",
            format!("-{} -{:.0}% until {}", entry.amount, entry.percent * 100.0, entry.till_frame),
        ));
    }

    lines.push(Line::from(""));
    lines.push(section("Grants"));
    for grant in energy.grants().iter().filter(|g| g.is_live(frame)) {
        let source = match grant.source {
            GrantSource::All => "all".to_string(),
            GrantSource::Object(id) => id.to_string(),
        };
        lines.push(stat_line(
            &format!("  to {}", app.player_name(Some(grant.recipient))),
            format!("cap {} from {} until {}", grant.cap(), source, grant.till_frame),
        ));
    }
    if !energy.receiving_from().is_empty() {
        let from: Vec<&str> = energy
            .receiving_from()
            .iter()
            .map(|p| app.player_name(Some(*p)))
            .collect();
        lines.push(stat_line("  receiving from", from.join(", ")));
    }

    let border = if focused { Color::Yellow } else { Color::White };
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", player.name)),
    );
    f.render_widget(paragraph, area);
}
