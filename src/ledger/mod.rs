// ============================================================================
// Module : ledger
// ============================================================================
// Le coeur du wallet : soldes par devise et conversion via les taux
//
// CONCEPTS RUST :
// 1. Validation avant mutation : toutes les vérifications se font AVANT de
//    toucher aux soldes, donc un échec ne laisse jamais d'état partiel
// 2. Result<T, LedgerError> : erreurs typées avec thiserror
// 3. Ledger synchrone + Wallet async : la logique pure est testable sans
//    runtime, la synchronisation est ajoutée par-dessus
// 4. Decimal pour les soldes, f64 pour les taux : deposit puis withdraw
//    du même montant restaure le solde exactement
// ============================================================================

pub mod error;  // Erreurs typées du ledger
pub mod wallet; // Handle async partagé (Mutex + RateProvider)

pub use error::LedgerError;
pub use wallet::Wallet;

use std::collections::HashMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{CurrencySet, RateTable};

/// Soldes par devise pour un ensemble fixe de devises
///
/// Invariant : chaque solde est >= 0.
///
/// CONCEPT RUST : HashMap<String, Decimal>
/// - Decimal est Copy : `.copied()` sur un Option<&Decimal> suffit
/// - L'ordre d'affichage vient du CurrencySet, pas de la HashMap
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    currencies: CurrencySet,
    balances: HashMap<String, Decimal>,
}

impl Ledger {
    /// Crée un ledger avec tous les soldes à zéro
    pub fn new(currencies: CurrencySet) -> Self {
        let balances = currencies
            .codes()
            .map(|code| (code.to_string(), Decimal::ZERO))
            .collect();
        Self {
            currencies,
            balances,
        }
    }

    /// Solde d'une devise
    pub fn balance(&self, currency: &str) -> Result<Decimal, LedgerError> {
        self.balances
            .get(currency)
            .copied()
            .ok_or_else(|| LedgerError::UnsupportedCurrency(currency.to_string()))
    }

    /// Snapshot des soldes, dans l'ordre de priorité des devises
    pub fn balances(&self) -> Vec<(String, Decimal)> {
        self.currencies
            .codes()
            .map(|code| {
                let amount = self.balances.get(code).copied().unwrap_or(Decimal::ZERO);
                (code.to_string(), amount)
            })
            .collect()
    }

    /// Crédite `amount` sur `currency`
    ///
    /// CONCEPT RUST : checked_add
    /// - Retourne None au lieu de paniquer si le résultat dépasse Decimal::MAX
    pub fn deposit(&mut self, currency: &str, amount: Decimal) -> Result<(), LedgerError> {
        self.ensure_supported(currency)?;
        ensure_valid_amount(amount)?;

        let balance = self.balance_mut(currency)?;
        let updated = balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        *balance = updated;

        debug!(currency, %amount, balance = %updated, "Deposit applied");
        Ok(())
    }

    /// Débite `amount` de `currency`
    ///
    /// Échoue avec `InsufficientBalance` si le solde est trop faible ;
    /// le solde n'est alors pas modifié.
    pub fn withdraw(&mut self, currency: &str, amount: Decimal) -> Result<(), LedgerError> {
        self.ensure_supported(currency)?;
        ensure_valid_amount(amount)?;
        self.ensure_sufficient(currency, amount)?;

        let balance = self.balance_mut(currency)?;
        *balance -= amount;
        let remaining = *balance;

        debug!(currency, %amount, balance = %remaining, "Withdrawal applied");
        Ok(())
    }

    /// Convertit `amount` de `from` vers `to` avec les taux donnés
    ///
    /// Conversion en deux sauts via l'unité de référence :
    /// `amount * rate[from] / rate[to]`, calculée en f64 puis ramenée en
    /// Decimal. Le débit et le crédit ne sont appliqués qu'une fois toutes
    /// les vérifications passées.
    ///
    /// Une conversion vers la même devise retourne `amount` sans toucher
    /// aux soldes ni aux taux.
    ///
    /// # Retourne
    /// * Le montant crédité sur `to`
    pub fn convert(
        &mut self,
        from: &str,
        to: &str,
        amount: Decimal,
        rates: &RateTable,
    ) -> Result<Decimal, LedgerError> {
        self.ensure_supported(from)?;
        self.ensure_supported(to)?;
        ensure_valid_amount(amount)?;
        self.ensure_sufficient(from, amount)?;

        if from == to {
            debug!(currency = from, %amount, "Same-currency conversion, nothing to do");
            return Ok(amount);
        }

        let from_rate = lookup_rate(rates, from)?;
        let to_rate = lookup_rate(rates, to)?;

        let usd_value = amount.to_f64().ok_or(LedgerError::InvalidAmount(amount))? * from_rate;

        // Un résultat infini ou hors des bornes de Decimal vient du rapport
        // des taux : on le signale sur la devise cible
        let converted = Decimal::from_f64(usd_value / to_rate).ok_or_else(|| {
            LedgerError::InvalidRate {
                currency: to.to_string(),
                rate: to_rate,
            }
        })?;

        let credited = self
            .balance(to)?
            .checked_add(converted)
            .ok_or(LedgerError::InvalidAmount(amount))?;

        // Toutes les vérifications sont passées : débit + crédit
        *self.balance_mut(from)? -= amount;
        *self.balance_mut(to)? = credited;

        debug!(from, to, %amount, usd_value, %converted, "Conversion applied");
        Ok(converted)
    }

    /// Valeur totale du portefeuille en unité de référence
    ///
    /// Les devises sans taux dans la table sont ignorées.
    pub fn total_value(&self, rates: &RateTable) -> f64 {
        self.balances()
            .into_iter()
            .filter(|(_, amount)| amount.is_sign_positive() && !amount.is_zero())
            .filter_map(|(code, amount)| match rates.get(&code) {
                Some(rate) => amount.to_f64().map(|amount| amount * rate),
                None => {
                    warn!(currency = %code, "No rate available, skipped from total");
                    None
                }
            })
            .sum()
    }

    fn ensure_supported(&self, currency: &str) -> Result<(), LedgerError> {
        if self.currencies.contains(currency) {
            Ok(())
        } else {
            Err(LedgerError::UnsupportedCurrency(currency.to_string()))
        }
    }

    fn ensure_sufficient(&self, currency: &str, amount: Decimal) -> Result<(), LedgerError> {
        let available = self.balance(currency)?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                currency: currency.to_string(),
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    fn balance_mut(&mut self, currency: &str) -> Result<&mut Decimal, LedgerError> {
        self.balances
            .get_mut(currency)
            .ok_or_else(|| LedgerError::UnsupportedCurrency(currency.to_string()))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(CurrencySet::default())
    }
}

fn ensure_valid_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount < Decimal::ZERO {
        Err(LedgerError::InvalidAmount(amount))
    } else {
        Ok(())
    }
}

fn lookup_rate(rates: &RateTable, currency: &str) -> Result<f64, LedgerError> {
    let rate = rates
        .get(currency)
        .ok_or_else(|| LedgerError::RateUnavailable(format!("pas de taux pour {}", currency)))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(LedgerError::InvalidRate {
            currency: currency.to_string(),
            rate,
        });
    }
    Ok(rate)
}

// ============================================================================
// Tests unitaires
// ============================================================================
