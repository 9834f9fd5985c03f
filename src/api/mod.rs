// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les sources de taux de change (RateProvider) :
// fichier JSON, endpoint HTTP /rates, CoinGecko, table fixe en mémoire.
//
// CONCEPT RUST : Trait objects
// - Le Wallet reçoit un Arc<dyn RateProvider>
// - N'importe quelle source peut être injectée (tests, offline, réseau)
// ============================================================================

pub mod coingecko; // Client API CoinGecko (simple/price)
pub mod file;      // Fichier JSON local
pub mod fixed;     // Table fixe en mémoire
pub mod http;      // Endpoint HTTP /rates

use anyhow::Result;
use async_trait::async_trait;

use crate::models::RateTable;

/// Source de taux : code devise -> prix en unité de référence
///
/// CONCEPT RUST : async_trait
/// - Les méthodes async dans un trait objet nécessitent async_trait
/// - Send + Sync : le provider est partagé entre threads via Arc
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Récupère un snapshot frais des taux
    async fn fetch_rates(&self) -> Result<RateTable>;

    /// Nom de la source (pour les logs et l'affichage)
    fn name(&self) -> &str;
}

// Re-export des providers
pub use coingecko::CoinGeckoRateProvider;
pub use file::FileRateProvider;
pub use fixed::FixedRateProvider;
pub use http::HttpRateProvider;
