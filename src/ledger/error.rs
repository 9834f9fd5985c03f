// ============================================================================
// Erreurs du ledger
// ============================================================================
// Toutes les erreurs sont locales à l'opération qui a échoué : le ledger
// reste utilisable et ses soldes sont inchangés.
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère impl std::error::Error + Display
// - #[error("...")] : message formaté à partir des champs du variant
// - Contrairement à anyhow, l'appelant peut matcher chaque cas
// ============================================================================

use rust_decimal::Decimal;
use thiserror::Error;

/// Erreurs retournées par [`Ledger`](super::Ledger) et [`Wallet`](super::Wallet).
///
/// Les montants sont des `Decimal` (soldes exacts), les taux des `f64`
/// (valeurs de marché).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Solde insuffisant en {currency} : disponible {available}, demandé {requested}")]
    InsufficientBalance {
        currency: String,
        available: Decimal,
        requested: Decimal,
    },
    #[error("Taux indisponible : {0}")]
    RateUnavailable(String),
    #[error("Taux invalide pour {currency} : {rate}")]
    InvalidRate { currency: String, rate: f64 },
    #[error("Devise non supportée : `{0}`")]
    UnsupportedCurrency(String),
    #[error("Montant invalide : {0}")]
    InvalidAmount(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InsufficientBalance {
            currency: "USDT".to_string(),
            available: dec!(50),
            requested: dec!(100.5),
        };
        assert_eq!(
            err.to_string(),
            "Solde insuffisant en USDT : disponible 50, demandé 100.5"
        );
        assert_eq!(
            LedgerError::InvalidAmount(dec!(-1)).to_string(),
            "Montant invalide : -1"
        );
    }
}
