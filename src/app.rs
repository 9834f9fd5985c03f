// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état de l'interface TUI du wallet
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Séparation : App ne touche jamais au Ledger directement, elle produit
//    des WalletRequest que le worker exécute sur le Wallet
// ============================================================================

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{CurrencyInfo, CurrencySet, RateTable};

// ============================================================================
// Enums : Screen, Operation, WalletRequest
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : soldes et taux
    Dashboard,

    /// Mode saisie : montant (et devise cible pour un swap)
    InputMode,
}

/// Opération en cours de saisie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deposit,
    Withdraw,
    Swap,
}

impl Operation {
    /// Prompt affiché dans la ligne de saisie
    pub fn prompt(&self, currency: &str) -> String {
        match self {
            Operation::Deposit => format!("Deposit {} (amount): ", currency),
            Operation::Withdraw => format!("Withdraw {} (amount | max): ", currency),
            Operation::Swap => format!("Swap {} (amount | max) TARGET: ", currency),
        }
    }
}

/// Requête validée, prête à être exécutée sur le Wallet
///
/// CONCEPT RUST : enum avec données
/// - Chaque variant porte exactement les champs dont il a besoin
/// - Le worker fait un `match` exhaustif : pas de requête oubliée
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletRequest {
    Deposit { currency: String, amount: Decimal },
    Withdraw { currency: String, amount: Decimal },
    Swap { from: String, to: String, amount: Decimal },
}

/// Message de statut affiché dans le footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Devises supportées (ordre d'affichage)
    pub currencies: CurrencySet,

    /// Dernier snapshot des soldes reçu du wallet
    pub balances: Vec<(String, Decimal)>,

    /// Dernier snapshot des taux (None tant que non chargé)
    pub rates: Option<RateTable>,

    /// Nom de la source de taux (ex: "coingecko")
    pub rate_source: String,

    /// Index de la devise sélectionnée
    pub selected_index: usize,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Two-step quit
    pub confirm_quit: bool,

    /// Indique si une opération est en cours côté worker
    pub is_loading: bool,

    /// Message de chargement optionnel
    pub loading_message: Option<String>,

    /// Buffer de saisie pour le mode Input
    pub input_buffer: String,

    /// Prompt affiché en mode Input
    pub input_prompt: String,

    /// Opération en cours de saisie
    pub pending_operation: Option<Operation>,

    /// Dernier message de statut (succès ou erreur)
    pub status: Option<Status>,
}

impl App {
    /// Crée l'état initial : soldes à zéro, pas de taux
    pub fn new(currencies: CurrencySet, rate_source: impl Into<String>) -> Self {
        let balances = currencies
            .codes()
            .map(|code| (code.to_string(), Decimal::ZERO))
            .collect();
        Self {
            running: true,
            currencies,
            balances,
            rates: None,
            rate_source: rate_source.into(),
            selected_index: 0,
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            input_buffer: String::new(),
            input_prompt: String::new(),
            pending_operation: None,
            status: None,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Navigue vers le haut (saturating_sub : ne descend pas sous 0)
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Navigue vers le bas, limité à la dernière devise
    pub fn navigate_down(&mut self) {
        let max_index = self.currencies.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Devise sélectionnée
    pub fn selected_currency(&self) -> Option<&CurrencyInfo> {
        self.currencies.get_index(self.selected_index)
    }

    /// Solde affiché pour une devise
    pub fn balance_of(&self, code: &str) -> Decimal {
        self.balances
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, amount)| *amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Valeur d'un solde en unité de référence (None sans taux)
    ///
    /// CONCEPT RUST : ToPrimitive
    /// - `to_f64()` : le solde exact passe en f64 seulement pour l'affichage
    pub fn value_of(&self, code: &str) -> Option<f64> {
        let rate = self.rates.as_ref()?.get(code)?;
        Some(self.balance_of(code).to_f64()? * rate)
    }

    /// Valeur totale du portefeuille (None tant que les taux ne sont pas chargés)
    pub fn total_value(&self) -> Option<f64> {
        self.rates.as_ref()?;
        Some(
            self.balances
                .iter()
                .filter_map(|(code, _)| self.value_of(code))
                .sum(),
        )
    }

    pub fn update_balances(&mut self, balances: Vec<(String, Decimal)>) {
        self.balances = balances;
    }

    pub fn update_rates(&mut self, rates: RateTable) {
        self.rates = Some(rates);
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    // ========================================================================
    // Confirmation de quit
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Chargement et statut
    // ========================================================================

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Info(message.into()));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Error(message.into()));
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode saisie pour une opération sur la devise sélectionnée
    pub fn start_operation(&mut self, operation: Operation) {
        let Some(code) = self.selected_currency().map(|c| c.code.clone()) else {
            return;
        };
        self.current_screen = Screen::InputMode;
        self.input_buffer.clear();
        self.input_prompt = operation.prompt(&code);
        self.pending_operation = Some(operation);
        self.clear_status();
    }

    /// Annule la saisie et retourne au dashboard
    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
        self.input_prompt.clear();
        self.pending_operation = None;
    }

    /// Valide la saisie et retourne au dashboard
    ///
    /// Retourne la requête à exécuter, ou un message d'erreur de saisie.
    pub fn submit_input(&mut self) -> Result<WalletRequest, String> {
        let input = std::mem::take(&mut self.input_buffer);
        let operation = self.pending_operation.take();
        self.current_screen = Screen::Dashboard;
        self.input_prompt.clear();

        let operation = operation.ok_or_else(|| "Aucune opération en cours".to_string())?;
        let currency = self
            .selected_currency()
            .map(|c| c.code.clone())
            .ok_or_else(|| "Aucune devise sélectionnée".to_string())?;

        self.build_request(operation, &currency, &input)
    }

    /// Transforme une saisie en requête
    ///
    /// Formats acceptés :
    /// - Deposit : `<amount>`
    /// - Withdraw : `<amount>` ou `max`
    /// - Swap : `<amount|max> <TARGET>`
    pub fn build_request(
        &self,
        operation: Operation,
        currency: &str,
        input: &str,
    ) -> Result<WalletRequest, String> {
        let mut parts = input.split_whitespace();
        let amount_str = parts.next().ok_or_else(|| "Montant manquant".to_string())?;

        let amount = if amount_str.eq_ignore_ascii_case("max") && operation != Operation::Deposit {
            self.balance_of(currency)
        } else {
            parse_amount(amount_str)?
        };

        let request = match operation {
            Operation::Deposit => WalletRequest::Deposit {
                currency: currency.to_string(),
                amount,
            },
            Operation::Withdraw => WalletRequest::Withdraw {
                currency: currency.to_string(),
                amount,
            },
            Operation::Swap => {
                let target = parts
                    .next()
                    .ok_or_else(|| "Devise cible manquante".to_string())?
                    .to_uppercase();
                WalletRequest::Swap {
                    from: currency.to_string(),
                    to: target,
                    amount,
                }
            }
        };

        if parts.next().is_some() {
            return Err(format!("Saisie invalide : {}", input.trim()));
        }

        Ok(request)
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }
}

/// Parse un montant positif (accepte la virgule décimale)
///
/// Le texte est lu directement en Decimal : "0.1" vaut exactement 0.1.
fn parse_amount(input: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(&input.replace(',', "."))
        .map_err(|_| format!("Montant invalide : {}", input))?;

    if amount <= Decimal::ZERO {
        return Err(format!("Le montant doit être positif : {}", input));
    }
    Ok(amount)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn app() -> App {
        App::new(CurrencySet::default(), "fixed")
    }

    #[test]
    fn test_app_creation() {
        let app = app();
        assert!(app.is_running());
        assert_eq!(app.balances.len(), 7);
        assert_eq!(app.selected_currency().map(|c| c.code.as_str()), Some("USDT"));
        assert_eq!(app.total_value(), None);
    }

    #[test]
    fn test_app_quit() {
        let mut app = app();
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_navigation() {
        let mut app = App::new(CurrencySet::from_codes(&["USDT", "BTC", "ETH"]).unwrap(), "fixed");

        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        // Au max : reste à 2
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        app.navigate_up();
        app.navigate_up();
        app.navigate_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_deposit_input() {
        let mut app = app();
        app.start_operation(Operation::Deposit);
        assert!(app.is_in_input_mode());

        for c in "12,5".chars() {
            app.append_char(c);
        }

        let request = app.submit_input().unwrap();
        assert_eq!(
            request,
            WalletRequest::Deposit {
                currency: "USDT".to_string(),
                amount: dec!(12.5)
            }
        );
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_swap_input_with_max() {
        let mut app = app();
        app.update_balances(vec![("USDT".to_string(), dec!(42))]);

        let request = app.build_request(Operation::Swap, "USDT", "max btc").unwrap();
        assert_eq!(
            request,
            WalletRequest::Swap {
                from: "USDT".to_string(),
                to: "BTC".to_string(),
                amount: dec!(42)
            }
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let app = app();
        assert!(app.build_request(Operation::Deposit, "USDT", "").is_err());
        assert!(app.build_request(Operation::Deposit, "USDT", "abc").is_err());
        assert!(app.build_request(Operation::Deposit, "USDT", "-5").is_err());
        assert!(app.build_request(Operation::Deposit, "USDT", "0").is_err());
        assert!(app.build_request(Operation::Deposit, "USDT", "NaN").is_err());
        assert!(app.build_request(Operation::Deposit, "USDT", "max").is_err());
        assert!(app.build_request(Operation::Swap, "USDT", "10").is_err());
        assert!(app.build_request(Operation::Withdraw, "USDT", "10 20").is_err());
    }

    #[test]
    fn test_cancel_input() {
        let mut app = app();
        app.start_operation(Operation::Withdraw);
        app.append_char('1');
        app.cancel_input();

        assert!(app.is_on_dashboard());
        assert!(app.input_buffer.is_empty());
        assert!(app.pending_operation.is_none());
    }

    #[test]
    fn test_total_value() {
        let mut app = app();
        app.update_balances(vec![
            ("USDT".to_string(), dec!(10)),
            ("BTC".to_string(), dec!(0.5)),
        ]);
        app.update_rates(RateTable::from_pairs([("USDT", 1.0), ("BTC", 40_000.0)]));

        assert_eq!(app.value_of("BTC"), Some(20_000.0));
        assert_eq!(app.total_value(), Some(20_010.0));
    }
}
