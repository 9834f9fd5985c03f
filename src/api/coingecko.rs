// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère les prix en USD depuis l'API publique CoinGecko (simple/price)
// et ajoute les actifs locaux dont le prix est fixe (USDT, BLINK).
//
// Réponse CoinGecko :
//   { "bitcoin": { "usd": 43251.37 }, "ethereum": { "usd": 2287.11 }, ... }
// ============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::api::RateProvider;
use crate::models::RateTable;

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";

/// Correspondance identifiant CoinGecko -> code devise
///
/// CONCEPT RUST : tableau const de tuples
/// - Évalué à la compilation, aucune allocation
/// - Suffisant pour 5 entrées (une HashMap serait superflue)
const COIN_IDS: [(&str, &str); 5] = [
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("solana", "SOL"),
    ("tron", "TRX"),
    ("the-open-network", "TON"),
];

/// Actifs dont le prix est fixé localement
const LOCAL_ASSETS: [(&str, f64); 2] = [("USDT", 1.0), ("BLINK", 100.0)];

/// Réponse CoinGecko : id -> (devise -> prix)
///
/// CONCEPT RUST : alias de type
/// - Nomme un type imbriqué sans créer de struct
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// Client CoinGecko
#[derive(Debug, Clone)]
pub struct CoinGeckoRateProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoRateProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(COINGECKO_BASE_URL)
    }

    /// Permet de pointer vers un miroir ou un proxy
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("blinkwallet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Construit l'URL simple/price pour tous les ids connus
fn build_coingecko_url(base_url: &str) -> String {
    let ids: Vec<&str> = COIN_IDS.iter().map(|(id, _)| *id).collect();
    format!(
        "{}/api/v3/simple/price?ids={}&vs_currencies=usd",
        base_url,
        ids.join(",")
    )
}

/// Convertit la réponse CoinGecko en table de taux
///
/// Les ids absents de la réponse sont ignorés (avec un warning),
/// les actifs locaux sont toujours présents.
fn parse_coingecko_response(response: SimplePriceResponse) -> Result<RateTable> {
    let mut rates: HashMap<String, f64> = LOCAL_ASSETS
        .iter()
        .map(|&(code, price)| (code.to_string(), price))
        .collect();

    for (id, code) in COIN_IDS {
        match response.get(id).and_then(|prices| prices.get("usd")) {
            Some(&price) => {
                rates.insert(code.to_string(), price);
            }
            None => warn!(coin = id, "Missing USD price in CoinGecko response"),
        }
    }

    let table = RateTable::new(rates);
    table.validate()?;
    Ok(table)
}

#[async_trait]
impl RateProvider for CoinGeckoRateProvider {
    #[instrument(skip(self))]
    async fn fetch_rates(&self) -> Result<RateTable> {
        let url = build_coingecko_url(&self.base_url);
        debug!(url = %url, "Built CoinGecko API URL");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Échec de la requête HTTP vers CoinGecko")?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, "CoinGecko returned error status");
            anyhow::bail!("CoinGecko a retourné une erreur : HTTP {}", status);
        }

        let prices: SimplePriceResponse = response
            .json()
            .await
            .context("Échec du parsing JSON de la réponse CoinGecko")?;

        let table = parse_coingecko_response(prices)?;
        info!(rates = table.len(), "Successfully fetched CoinGecko rates");
        Ok(table)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_coingecko_url() {
        let url = build_coingecko_url(COINGECKO_BASE_URL);
        assert!(url.starts_with("https://api.coingecko.com/api/v3/simple/price?ids=bitcoin,"));
        assert!(url.contains("the-open-network"));
        assert!(url.ends_with("&vs_currencies=usd"));
    }

    #[test]
    fn test_parse_coingecko_response() {
        let body = r#"{
            "bitcoin": { "usd": 43251.37 },
            "ethereum": { "usd": 2287.11 },
            "solana": { "usd": 98.4 },
            "tron": { "usd": 0.105 },
            "the-open-network": { "usd": 2.31 }
        }"#;
        let response: SimplePriceResponse = serde_json::from_str(body).unwrap();

        let table = parse_coingecko_response(response).unwrap();
        assert_eq!(table.len(), 7);
        assert_eq!(table.get("BTC"), Some(43251.37));
        assert_eq!(table.get("TON"), Some(2.31));
        assert_eq!(table.get("USDT"), Some(1.0));
        assert_eq!(table.get("BLINK"), Some(100.0));
    }

    #[test]
    fn test_parse_partial_response_keeps_local_assets() {
        let response: SimplePriceResponse =
            serde_json::from_str(r#"{ "bitcoin": { "usd": 50000.0 } }"#).unwrap();

        let table = parse_coingecko_response(response).unwrap();
        assert_eq!(table.get("BTC"), Some(50000.0));
        assert_eq!(table.get("ETH"), None);
        assert_eq!(table.get("USDT"), Some(1.0));
    }
}
