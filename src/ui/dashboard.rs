// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI : valeur totale, soldes par devise, raccourcis
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, List)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, Screen, Status};

/// Dessine l'interface complète
///
/// Le dashboard est toujours affiché ; en mode saisie le footer est
/// remplacé par la ligne d'input.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_balances(frame, app, chunks[1]);

    match app.current_screen {
        Screen::Dashboard => render_footer(frame, app, chunks[2]),
        Screen::InputMode => render_input_footer(frame, app, chunks[2]),
    }
}

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header : titre + valeur totale
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(4), // Footer : statut + raccourcis
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : valeur totale et source des taux
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" BlinkWallet ")
        .title_alignment(Alignment::Center);

    let total = match app.total_value() {
        Some(total) => Span::styled(
            format!("Total ≈ ${:.2}", total),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("Total : taux non chargés", Style::default().fg(Color::Gray)),
    };

    let updated = match &app.rates {
        Some(rates) => format!(
            "Taux : {} · {}",
            app.rate_source,
            rates.fetched_at.format("%H:%M:%S UTC")
        ),
        None => format!("Taux : {}", app.rate_source),
    };

    let text = vec![
        Line::from(total),
        Line::from(Span::styled(updated, Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Main Content : soldes par devise
// ============================================================================

/// Une ligne par devise : nom, solde (avec code), prix, valeur, variation 24h
fn render_balances(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_loading_data() {
        format!(
            " Assets · {} ",
            app.loading_message.as_deref().unwrap_or("Chargement...")
        )
    } else {
        " Assets ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let items: Vec<ListItem> = app
        .currencies
        .iter()
        .enumerate()
        .map(|(index, currency)| {
            let balance = app.balance_of(&currency.code);
            let rate = app.rates.as_ref().and_then(|r| r.get(&currency.code));
            let change = app
                .rates
                .as_ref()
                .and_then(|r| r.change_percent(&currency.code));

            let balance_str = currency.format_amount(balance);
            let rate_str = rate
                .map(|r| format!("${:.2}", r))
                .unwrap_or_else(|| "N/A".to_string());
            let value_str = app
                .value_of(&currency.code)
                .map(|v| format!("${:.2}", v))
                .unwrap_or_default();
            let change_str = change
                .map(|c| {
                    let arrow = if c >= 0.0 { "▲" } else { "▼" };
                    format!("{} {:+.2}%", arrow, c)
                })
                .unwrap_or_default();

            let line = format!(
                " {:<10} {:>24} {:>12} {:>12}  {}",
                currency.name, balance_str, rate_str, value_str, change_str
            );

            let style = match change {
                Some(c) if c >= 0.0 => Style::default().fg(Color::Green),
                Some(_) => Style::default().fg(Color::Red),
                None if rate.is_some() => Style::default().fg(Color::White),
                None => Style::default().fg(Color::Gray),
            };

            if index == app.selected_index {
                ListItem::new(line).style(
                    style
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::REVERSED),
                )
            } else {
                ListItem::new(line).style(style)
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// ============================================================================
// Footer : statut + raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let status = match &app.status {
        Some(Status::Info(message)) => {
            Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Green)))
        }
        Some(Status::Error(message)) => Line::from(Span::styled(
            format!("✗ {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(""),
    };

    let key = |k: &'static str, color: Color| {
        Span::styled(k, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            key("[q]", Color::Yellow),
            Span::raw(" Quit  "),
            key("[↑↓ / j k]", Color::Yellow),
            Span::raw(" Navigate  "),
            key("[d]", Color::Green),
            Span::raw(" Deposit  "),
            key("[w]", Color::Red),
            Span::raw(" Withdraw  "),
            key("[s]", Color::Magenta),
            Span::raw(" Swap  "),
            key("[r]", Color::Cyan),
            Span::raw(" Refresh"),
        ])
    };

    let paragraph = Paragraph::new(vec![status, shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie : prompt + buffer + curseur
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        Span::styled(
            "[Enter]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Confirm  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
