// ============================================================================
// Configuration de l'application
// ============================================================================
// Sources, de la plus faible à la plus forte :
// 1. valeurs par défaut
// 2. fichier `blinkwallet.toml` (optionnel, répertoire courant)
// 3. variables d'environnement `BLINKWALLET__<SECTION>__<CLE>`
//    (ex: `BLINKWALLET__RATES__SOURCE=http`,
//     `BLINKWALLET__WALLET__CURRENCIES=USDT,BTC`)
//
//   [rates]
//   source = "file"          # file | http | coingecko | fixed
//   path = "rates.json"
//   url = "https://rates.example.org"
//   timeout_secs = 5
//
//   [wallet]
//   currencies = ["USDT", "BTC", "ETH"]
//
// CONCEPT RUST : config::Config::builder
// - Chaque add_source écrase les clés des sources précédentes
// - try_deserialize remplit les structs serde d'un seul coup
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::api::{
    CoinGeckoRateProvider, FileRateProvider, FixedRateProvider, HttpRateProvider, RateProvider,
};
use crate::ledger::wallet::DEFAULT_RATE_TIMEOUT;
use crate::models::CurrencySet;

/// Source de taux configurée
///
/// CONCEPT RUST : #[serde(rename_all = "lowercase")]
/// - "coingecko" dans le TOML devient RateSource::Coingecko
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    File,
    Http,
    Coingecko,
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatesSettings {
    pub source: RateSource,
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletSettings {
    pub currencies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rates: RatesSettings,
    #[serde(default)]
    pub wallet: WalletSettings,
}

impl Settings {
    /// Charge `blinkwallet.toml` + l'environnement
    pub fn new() -> Result<Self> {
        Self::from_file("blinkwallet")
    }

    /// Charge depuis un fichier donné (sans extension), optionnel
    pub fn from_file(name: &str) -> Result<Self> {
        Self::load(name, None)
    }

    /// Charge fichier + variables d'environnement
    ///
    /// `env` remplace l'environnement du processus quand il est fourni.
    ///
    /// CONCEPT RUST : list_separator + with_list_parse_key
    /// - Seule `wallet.currencies` est découpée sur ',' ; les autres
    ///   variables restent des scalaires
    fn load(name: &str, env: Option<Map<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("rates.source", "fixed")?
            .set_default("rates.timeout_secs", DEFAULT_RATE_TIMEOUT.as_secs())?
            .add_source(File::with_name(name).required(false))
            .add_source(
                Environment::with_prefix("BLINKWALLET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("wallet.currencies")
                    .source(env),
            )
            .build()
            .context("Échec du chargement de la configuration")?;

        settings
            .try_deserialize()
            .context("Configuration invalide")
    }

    /// Timeout de récupération des taux
    pub fn rate_timeout(&self) -> Duration {
        Duration::from_secs(self.rates.timeout_secs)
    }

    /// Ensemble des devises supportées (défaut si non configuré)
    pub fn currency_set(&self) -> Result<CurrencySet> {
        match &self.wallet.currencies {
            Some(codes) => CurrencySet::from_codes(codes.as_slice()),
            None => Ok(CurrencySet::default()),
        }
    }

    /// Construit le RateProvider correspondant à la configuration
    pub fn rate_provider(&self) -> Result<Arc<dyn RateProvider>> {
        let provider: Arc<dyn RateProvider> = match self.rates.source {
            RateSource::File => {
                let path = self
                    .rates
                    .path
                    .clone()
                    .unwrap_or_else(FileRateProvider::default_path);
                Arc::new(FileRateProvider::new(path))
            }
            RateSource::Http => {
                let url = self
                    .rates
                    .url
                    .as_deref()
                    .context("rates.url est requis pour la source http")?;
                Arc::new(HttpRateProvider::new(url)?)
            }
            RateSource::Coingecko => match self.rates.url.as_deref() {
                Some(url) => Arc::new(CoinGeckoRateProvider::with_base_url(url)?),
                None => Arc::new(CoinGeckoRateProvider::new()?),
            },
            RateSource::Fixed => Arc::new(FixedRateProvider::offline_defaults()),
        };

        Ok(provider)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(source: RateSource) -> Settings {
        Settings {
            rates: RatesSettings {
                source,
                path: None,
                url: None,
                timeout_secs: 5,
            },
            wallet: WalletSettings { currencies: None },
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::from_file("does-not-exist-blinkwallet").unwrap();
        assert_eq!(settings.rate_timeout(), DEFAULT_RATE_TIMEOUT);
        assert_eq!(settings.currency_set().unwrap(), CurrencySet::default());
    }

    #[test]
    fn test_toml_file() {
        let path = std::env::temp_dir().join(format!("blinkwallet-settings-{}", std::process::id()));
        std::fs::write(
            path.with_extension("toml"),
            "[rates]\nsource = \"http\"\nurl = \"http://localhost:8080\"\ntimeout_secs = 2\n\n[wallet]\ncurrencies = [\"USDT\", \"BTC\"]\n",
        )
        .unwrap();

        let settings = Settings::from_file(path.to_str().unwrap()).unwrap();

        assert_eq!(settings.rates.source, RateSource::Http);
        assert_eq!(settings.rate_timeout(), Duration::from_secs(2));
        assert_eq!(settings.currency_set().unwrap().len(), 2);
        assert_eq!(settings.rate_provider().unwrap().name(), "http");

        std::fs::remove_file(path.with_extension("toml")).unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let env = Map::from([
            ("BLINKWALLET__WALLET__CURRENCIES".to_string(), "USDT,BTC".to_string()),
            ("BLINKWALLET__RATES__SOURCE".to_string(), "coingecko".to_string()),
            ("BLINKWALLET__RATES__TIMEOUT_SECS".to_string(), "3".to_string()),
        ]);

        let settings = Settings::load("does-not-exist-blinkwallet", Some(env)).unwrap();

        let codes: Vec<String> = settings
            .currency_set()
            .unwrap()
            .codes()
            .map(String::from)
            .collect();
        assert_eq!(codes, vec!["USDT", "BTC"]);
        assert_eq!(settings.rates.source, RateSource::Coingecko);
        assert_eq!(settings.rate_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_rate_provider_selection() {
        assert_eq!(settings(RateSource::Fixed).rate_provider().unwrap().name(), "fixed");
        assert_eq!(settings(RateSource::File).rate_provider().unwrap().name(), "file");
        assert_eq!(settings(RateSource::Coingecko).rate_provider().unwrap().name(), "coingecko");
        // http sans url : erreur de configuration
        assert!(settings(RateSource::Http).rate_provider().is_err());
    }
}
