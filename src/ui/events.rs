// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Polling avec timeout : la boucle continue même sans input
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement de l'affichage)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// - poll(tick_rate) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // On ne garde que Press (certains OS envoient aussi Release)
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

/// Retourne le KeyCode si l'événement est une touche
///
/// CONCEPT RUST : matches! sur Option<KeyCode>
/// - Les prédicats `is_*_event` se réduisent à un seul `matches!`
fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// 'q' : quitter
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    )
}

/// Flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    )
}

/// 'd' : dépôt sur la devise sélectionnée
pub fn is_deposit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('d') | KeyCode::Char('D')))
}

/// 'w' : retrait
pub fn is_withdraw_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('w') | KeyCode::Char('W')))
}

/// 's' : swap (conversion)
pub fn is_swap_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('s') | KeyCode::Char('S')))
}

/// 'r' : rafraîchir les taux
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// Caractère valide dans la ligne de saisie : chiffres, lettres, '.', ',' et espace
pub fn is_input_char_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Char(c)) if c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | ' ')
    )
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_operation_keys() {
        assert!(is_deposit_event(&key(KeyCode::Char('d'))));
        assert!(is_withdraw_event(&key(KeyCode::Char('w'))));
        assert!(is_swap_event(&key(KeyCode::Char('s'))));
        assert!(is_refresh_event(&key(KeyCode::Char('r'))));
    }

    #[test]
    fn test_input_chars() {
        assert!(is_input_char_event(&key(KeyCode::Char('7'))));
        assert!(is_input_char_event(&key(KeyCode::Char('.'))));
        assert!(is_input_char_event(&key(KeyCode::Char(' '))));
        assert!(!is_input_char_event(&key(KeyCode::Char('-'))));
        assert!(!is_input_char_event(&key(KeyCode::Enter)));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('B'))), Some('B'));
    }
}
