// ============================================================================
// Structure : Wallet
// ============================================================================
// Handle async partagé autour d'un Ledger
//
// CONCEPTS RUST :
// 1. Arc<tokio::sync::Mutex<Ledger>> : un seul appel à la fois par wallet
//    (le check-then-mutate de chaque opération n'est jamais entrelacé)
// 2. Arc<dyn RateProvider> : la source de taux est injectée
// 3. tokio::time::timeout : la récupération des taux est bornée
//
// Le verrou est gardé pendant la récupération des taux : deux conversions
// concurrentes sur le même wallet s'exécutent l'une après l'autre.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::api::RateProvider;
use crate::ledger::{Ledger, LedgerError};
use crate::models::RateTable;

/// Timeout par défaut pour la récupération des taux
pub const DEFAULT_RATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wallet partageable entre tâches et threads
///
/// CONCEPT RUST : Clone bon marché
/// - Cloner un Wallet clone les Arc, pas le ledger
/// - Tous les clones partagent les mêmes soldes
#[derive(Clone)]
pub struct Wallet {
    ledger: Arc<Mutex<Ledger>>,
    provider: Arc<dyn RateProvider>,
    rate_timeout: Duration,
}

impl Wallet {
    pub fn new(ledger: Ledger, provider: Arc<dyn RateProvider>, rate_timeout: Duration) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            provider,
            rate_timeout,
        }
    }

    /// Nom de la source de taux
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Snapshot des soldes (ordre de priorité)
    pub async fn balances(&self) -> Vec<(String, Decimal)> {
        self.ledger.lock().await.balances()
    }

    /// Solde d'une devise
    pub async fn balance(&self, currency: &str) -> Result<Decimal, LedgerError> {
        self.ledger.lock().await.balance(currency)
    }

    #[instrument(skip(self))]
    pub async fn deposit(&self, currency: &str, amount: Decimal) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.lock().await;
        ledger.deposit(currency, amount).map_err(|e| {
            warn!(error = %e, "Deposit rejected");
            e
        })?;
        info!("Deposit completed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn withdraw(&self, currency: &str, amount: Decimal) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.lock().await;
        ledger.withdraw(currency, amount).map_err(|e| {
            warn!(error = %e, "Withdrawal rejected");
            e
        })?;
        info!("Withdrawal completed");
        Ok(())
    }

    /// Convertit `amount` de `from` vers `to` avec des taux frais
    ///
    /// Les taux sont récupérés sous le verrou ; en cas d'échec (erreur du
    /// provider, timeout, taux manquant ou invalide) aucun solde ne bouge.
    ///
    /// # Retourne
    /// * Le montant crédité sur `to`
    #[instrument(skip(self), fields(provider = %self.provider.name()))]
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let mut ledger = self.ledger.lock().await;
        let rates = self.fetch_rates_bounded().await?;

        let converted = ledger.convert(from, to, amount, &rates).map_err(|e| {
            warn!(error = %e, "Conversion rejected");
            e
        })?;

        info!(%converted, "Conversion completed");
        Ok(converted)
    }

    /// Récupère un snapshot des taux (pour l'affichage)
    pub async fn rates(&self) -> Result<RateTable, LedgerError> {
        self.fetch_rates_bounded().await
    }

    /// Valeur totale des soldes en unité de référence
    pub async fn total_value(&self, rates: &RateTable) -> f64 {
        self.ledger.lock().await.total_value(rates)
    }

    /// Appel au provider borné par `rate_timeout`
    ///
    /// Timeout et erreurs du provider deviennent `RateUnavailable`.
    async fn fetch_rates_bounded(&self) -> Result<RateTable, LedgerError> {
        match tokio::time::timeout(self.rate_timeout, self.provider.fetch_rates()).await {
            Ok(Ok(rates)) => Ok(rates),
            Ok(Err(e)) => {
                error!(provider = %self.provider.name(), error = ?e, "Rate provider failed");
                Err(LedgerError::RateUnavailable(format!("{:#}", e)))
            }
            Err(_) => {
                error!(
                    provider = %self.provider.name(),
                    timeout_ms = self.rate_timeout.as_millis() as u64,
                    "Rate provider timed out"
                );
                Err(LedgerError::RateUnavailable(format!(
                    "délai dépassé ({} ms)",
                    self.rate_timeout.as_millis()
                )))
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FixedRateProvider;
    use anyhow::Result;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    /// Provider qui ne répond jamais à temps
    struct SlowProvider;

    #[async_trait]
    impl RateProvider for SlowProvider {
        async fn fetch_rates(&self) -> Result<RateTable> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RateTable::from_pairs([("USDT", 1.0)]))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Provider toujours en erreur
    struct FailingProvider;

    #[async_trait]
    impl RateProvider for FailingProvider {
        async fn fetch_rates(&self) -> Result<RateTable> {
            anyhow::bail!("connexion refusée")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn wallet_with(provider: Arc<dyn RateProvider>) -> Wallet {
        Wallet::new(Ledger::default(), provider, Duration::from_millis(50))
    }

    fn fixed() -> Arc<dyn RateProvider> {
        Arc::new(FixedRateProvider::new(RateTable::from_pairs([
            ("USDT", 1.0),
            ("BTC", 40_000.0),
        ])))
    }

    #[tokio::test]
    async fn test_wallet_convert() {
        let wallet = wallet_with(fixed());
        wallet.deposit("USDT", dec!(100)).await.unwrap();

        let btc = wallet.convert("USDT", "BTC", dec!(100)).await.unwrap();

        assert_eq!(btc, dec!(0.0025));
        assert_eq!(wallet.balance("USDT").await, Ok(Decimal::ZERO));
        assert_eq!(wallet.balance("BTC").await, Ok(dec!(0.0025)));
    }

    #[tokio::test]
    async fn test_wallet_timeout_is_rate_unavailable() {
        let wallet = wallet_with(Arc::new(SlowProvider));
        wallet.deposit("USDT", dec!(10)).await.unwrap();
        let before = wallet.balances().await;

        let err = wallet.convert("USDT", "BTC", dec!(5)).await.unwrap_err();

        assert!(matches!(err, LedgerError::RateUnavailable(_)));
        assert_eq!(wallet.balances().await, before);
    }

    #[tokio::test]
    async fn test_wallet_provider_error_is_rate_unavailable() {
        let wallet = wallet_with(Arc::new(FailingProvider));
        wallet.deposit("USDT", dec!(10)).await.unwrap();

        let err = wallet.convert("USDT", "BTC", dec!(5)).await.unwrap_err();

        assert!(matches!(err, LedgerError::RateUnavailable(ref msg) if msg.contains("connexion refusée")));
        assert_eq!(wallet.balance("USDT").await, Ok(dec!(10)));
        assert!(wallet.rates().await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let wallet = wallet_with(fixed());
        wallet.deposit("USDT", dec!(100)).await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let wallet = wallet.clone();
            tasks.spawn(async move { wallet.withdraw("USDT", dec!(30)).await });
        }

        let mut succeeded = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(wallet.balance("USDT").await, Ok(dec!(10)));
    }

    #[tokio::test]
    async fn test_clones_share_balances() {
        let wallet = wallet_with(fixed());
        let other = wallet.clone();

        other.deposit("BTC", dec!(0.5)).await.unwrap();

        assert_eq!(wallet.balance("BTC").await, Ok(dec!(0.5)));
        assert_eq!(wallet.provider_name(), "fixed");
        assert_eq!(wallet.total_value(&wallet.rates().await.unwrap()).await, 20_000.0);
    }
}
