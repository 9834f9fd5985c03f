// ============================================================================
// Module : models
// ============================================================================
// Ce module contient les structures de données partagées du wallet
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// ============================================================================

pub mod currency;   // Devises supportées (CurrencyInfo, CurrencySet)
pub mod rate_table; // Snapshot des taux de change

// Re-export des structures principales pour simplifier les imports
// On peut faire : use blinkwallet::models::RateTable;
pub use currency::{CurrencyInfo, CurrencySet};
pub use rate_table::RateTable;
