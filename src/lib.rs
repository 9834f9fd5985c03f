// ============================================================================
// BlinkWallet - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;      // Sources de taux (RateProvider)
pub mod app;      // État de l'application TUI
pub mod ledger;   // Soldes et conversion (Ledger, Wallet)
pub mod models;   // Structures de données
pub mod settings; // Configuration (fichier + environnement)
pub mod ui;       // Interface utilisateur
