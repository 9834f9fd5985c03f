// ============================================================================
// Provider : fichier JSON local
// ============================================================================
// Lit un snapshot de taux depuis un fichier JSON :
//   { "USDT": 1.0, "BTC": 43251.37, ... }
//
// Le chemin est injecté au constructeur (pas de chemin global).
// ============================================================================

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::api::RateProvider;
use crate::models::RateTable;

/// Lit les taux depuis un fichier JSON à chaque appel
#[derive(Debug, Clone)]
pub struct FileRateProvider {
    path: PathBuf,
}

impl FileRateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Chemin par défaut : <data_local_dir>/blinkwallet/rates.json
    ///
    /// Linux : ~/.local/share/blinkwallet/rates.json
    ///
    /// CONCEPT RUST : unwrap_or_else
    /// - La closure n'est appelée que si `dirs` ne trouve rien
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blinkwallet")
            .join("rates.json")
    }
}

/// Parse le contenu JSON d'un fichier de taux
pub(crate) fn parse_rates_json(content: &str) -> Result<RateTable> {
    let rates: HashMap<String, f64> =
        serde_json::from_str(content).context("Échec du parsing JSON du fichier de taux")?;
    let table = RateTable::new(rates);
    table.validate()?;
    Ok(table)
}

#[async_trait]
impl RateProvider for FileRateProvider {
    #[instrument(skip(self))]
    async fn fetch_rates(&self) -> Result<RateTable> {
        debug!(path = %self.path.display(), "Reading rates file");
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Impossible de lire {}", self.path.display()))?;

        let table = parse_rates_json(&content)?;
        info!(rates = table.len(), "Rates loaded from file");
        Ok(table)
    }

    fn name(&self) -> &str {
        "file"
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("blinkwallet-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_rates_json() {
        let table = parse_rates_json(r#"{ "USDT": 1.0, "BTC": 43251.37, "BLINK": 100 }"#).unwrap();
        assert_eq!(table.get("BTC"), Some(43251.37));
        assert_eq!(table.get("BLINK"), Some(100.0));
    }

    #[test]
    fn test_parse_rates_json_rejects_bad_content() {
        assert!(parse_rates_json("not json").is_err());
        assert!(parse_rates_json(r#"{ "USDT": "one" }"#).is_err());
        assert!(parse_rates_json(r#"{ "USDT": -1.0 }"#).is_err());
    }

    #[tokio::test]
    async fn test_file_provider_reads_file() {
        let path = temp_file("ok", r#"{ "USDT": 1.0, "ETH": 2287.5 }"#);
        let provider = FileRateProvider::new(&path);

        let table = provider.fetch_rates().await.unwrap();
        assert_eq!(table.get("ETH"), Some(2287.5));

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_file_provider_missing_file() {
        let provider = FileRateProvider::new("/definitely/not/here/rates.json");
        assert!(provider.fetch_rates().await.is_err());
    }

    #[test]
    fn test_default_path() {
        let path = FileRateProvider::default_path();
        assert!(path.ends_with("blinkwallet/rates.json"));
    }
}
