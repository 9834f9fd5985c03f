// ============================================================================
// Provider : table fixe en mémoire
// ============================================================================
// Utilisé pour le mode offline et comme doublure dans les tests
// ============================================================================

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::api::RateProvider;
use crate::models::RateTable;

/// Retourne toujours la même table (réhorodatée à chaque appel)
///
/// CONCEPT RUST : doublure de test via un trait
/// - Le Wallet ne connaît que `dyn RateProvider`
/// - Les tests injectent cette table à la place du réseau
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    table: RateTable,
}

impl FixedRateProvider {
    pub fn new(table: RateTable) -> Self {
        Self { table }
    }

    /// Taux indicatifs utilisés quand aucune source n'est configurée
    pub fn offline_defaults() -> Self {
        Self::new(RateTable::from_pairs([
            ("USDT", 1.0),
            ("BTC", 60_000.0),
            ("ETH", 3_000.0),
            ("SOL", 150.0),
            ("TON", 5.0),
            ("TRX", 0.12),
            ("BLINK", 100.0),
        ]))
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn fetch_rates(&self) -> Result<RateTable> {
        self.table.validate()?;
        let mut table = self.table.clone();
        table.fetched_at = Utc::now();
        Ok(table)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
