//! Help tab view

use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let rules = &app.world.data().rules;
    let lines = vec![
        header("═══ Navigation ═══"),
        key_line("1-5", "Jump to tab (Units/Combat/Power/Upgrades/Help)"),
        key_line("Tab / Shift+Tab", "Next/previous tab"),
        key_line("↑/k  ↓/j", "Navigate lists"),
        key_line("p", "Run or pause the simulation"),
        key_line("t", "Advance one second (30 frames)"),
        key_line("w", "Write a JSON snapshot of the world"),
        key_line("r", "Reset the sandbox"),
        key_line("q / Ctrl+C", "Quit"),
        Line::from(""),
        header("═══ Combat ═══"),
        key_line("←/→", "Pick damage type"),
        key_line("+ / -", "Change amount by 25"),
        key_line("a / Enter / Space", "Fire at the selected object"),
        key_line("H", "Heal the selected object"),
        Line::from(""),
        header("═══ Power & Upgrades ═══"),
        key_line("s / Enter", "Black out the focused player"),
        key_line("x", "Other player steals all spare power"),
        key_line("Enter (Upgrades)", "Grant upgrade to the selected object or its owner"),
        Line::from(""),
        header("═══ Rules ═══"),
        Line::from(Span::styled("Armor:", Style::default().fg(Color::Yellow))),
        Line::from("  Damage × coefficient for its type; custom types follow their links"),
        Line::from("  Unresistable damage ignores armor"),
        Line::from(""),
        Line::from(Span::styled("Body states:", Style::default().fg(Color::Yellow))),
        Line::from(format!(
            "  Damaged at {:.0}% health, really damaged at {:.0}%",
            rules.body.unit_damaged_thresh * 100.0,
            rules.body.unit_really_damaged_thresh * 100.0
        )),
        Line::from(""),
        Line::from(Span::styled("Subdual & chrono:", Style::default().fg(Color::Yellow))),
        Line::from("  Subdued once the pool reaches max health; pools drain over time"),
        Line::from("  Chrono disables past its ratio and erases past max health"),
        Line::from(""),
        Line::from(Span::styled("Power:", Style::default().fg(Color::Yellow))),
        Line::from("  Sabotage expires on its own; stolen power is capped when taken"),
        Line::from(format!(
            "  Allies within {:.0} answer attacks on their friends",
            rules.retaliation.radius
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Help & Rules "));

    f.render_widget(paragraph, area);
}

fn header(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
}

fn key_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:20}", key), Style::default().fg(Color::Yellow)),
        Span::styled(desc.to_string(), Style::default().fg(Color::White)),
    ])
}
