// ============================================================================
// Structure : RateTable
// ============================================================================
// Snapshot des taux de change : code devise -> prix en unité de référence
// (USD / USDT). Fourni par un RateProvider, consommé par le Ledger.
//
// CONCEPTS RUST :
// 1. HashMap<String, f64> : lookup par code
// 2. DateTime<Utc> : horodatage du snapshot (chrono)
// 3. Option : la base journalière est optionnelle
// ============================================================================

use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

/// Taux de change à un instant donné
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    /// Prix courant de chaque devise en unité de référence
    rates: HashMap<String, f64>,

    /// Prix de référence du jour (pour la variation 24h)
    daily: Option<HashMap<String, f64>>,

    /// Moment où le snapshot a été récupéré
    pub fetched_at: DateTime<Utc>,
}

impl RateTable {
    /// Crée une table de taux horodatée maintenant
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self {
            rates,
            daily: None,
            fetched_at: Utc::now(),
        }
    }

    /// Crée une table depuis une liste de paires (pratique pour les tests)
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Ajoute la base journalière utilisée pour `change_percent`
    ///
    /// CONCEPT RUST : builder par valeur (`mut self`)
    /// - Consomme la table et la retourne modifiée, chaînable
    pub fn with_daily(mut self, daily: HashMap<String, f64>) -> Self {
        self.daily = Some(daily);
        self
    }

    /// Retourne le taux d'une devise s'il est présent
    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Variation en pourcentage depuis la base journalière
    ///
    /// (current - daily) / daily * 100, None si pas de base ou base nulle.
    ///
    /// CONCEPT RUST : l'opérateur ? sur Option
    /// - Chaque `?` retourne None dès qu'une valeur manque
    pub fn change_percent(&self, code: &str) -> Option<f64> {
        let current = self.get(code)?;
        let base = *self.daily.as_ref()?.get(code)?;
        if base == 0.0 {
            return None;
        }
        Some((current - base) / base * 100.0)
    }

    /// Vérifie que tous les taux sont finis et strictement positifs
    ///
    /// Appelé par les providers avant de retourner une table.
    pub fn validate(&self) -> Result<()> {
        if self.rates.is_empty() {
            bail!("Table de taux vide");
        }
        for (code, &rate) in &self.rates {
            if !rate.is_finite() || rate <= 0.0 {
                bail!("Taux invalide pour {} : {}", code, rate);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_rate() {
        let table = RateTable::from_pairs([("USDT", 1.0), ("BTC", 50_000.0)]);
        assert_eq!(table.get("BTC"), Some(50_000.0));
        assert_eq!(table.get("ETH"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        assert!(RateTable::from_pairs([("USDT", 1.0)]).validate().is_ok());
        assert!(RateTable::from_pairs([("USDT", 0.0)]).validate().is_err());
        assert!(RateTable::from_pairs([("USDT", -2.0)]).validate().is_err());
        assert!(RateTable::from_pairs([("USDT", f64::NAN)]).validate().is_err());
        assert!(RateTable::from_pairs::<&str>([]).validate().is_err());
    }

    #[test]
    fn test_change_percent() {
        let daily = HashMap::from([("BTC".to_string(), 40_000.0), ("ETH".to_string(), 0.0)]);
        let table = RateTable::from_pairs([("BTC", 50_000.0), ("ETH", 2_000.0), ("SOL", 100.0)])
            .with_daily(daily);

        assert_eq!(table.change_percent("BTC"), Some(25.0));
        // Base nulle : pas de variation
        assert_eq!(table.change_percent("ETH"), None);
        // Pas de base pour SOL
        assert_eq!(table.change_percent("SOL"), None);
    }
}
