// ============================================================================
// Provider : endpoint HTTP /rates
// ============================================================================
// Récupère les taux depuis le service de taux BlinkWallet
//
// Deux formats de réponse sont acceptés :
// 1. Map plate : { "USDT": 1.0, "BTC": 43251.37 }
// 2. Enveloppe : { "current": {...}, "daily": {...}, "roi": {...} }
//
// CONCEPT RUST : #[serde(untagged)]
// - Serde essaie chaque variant dans l'ordre jusqu'à ce qu'un match
// ============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::api::RateProvider;
use crate::models::RateTable;

/// Réponse de l'endpoint /rates
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RatesResponse {
    /// Format enveloppe avec base journalière (le champ "roi" est ignoré,
    /// on le recalcule depuis current/daily)
    Envelope {
        current: HashMap<String, f64>,
        #[serde(default)]
        daily: Option<HashMap<String, f64>>,
    },

    /// Format plat : code -> taux
    Flat(HashMap<String, f64>),
}

/// Client pour un endpoint `<base_url>/rates`
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpRateProvider {
    /// Crée un provider pour `base_url` (ex: "https://rates.example.org")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("blinkwallet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            client,
            url: build_rates_url(base_url),
        })
    }
}

/// Construit l'URL de l'endpoint /rates
fn build_rates_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/rates") {
        base.to_string()
    } else {
        format!("{}/rates", base)
    }
}

/// Parse le corps de la réponse en RateTable
fn parse_rates_response(body: &str) -> Result<RateTable> {
    let response: RatesResponse =
        serde_json::from_str(body).context("Échec du parsing JSON de la réponse /rates")?;

    let table = match response {
        RatesResponse::Envelope { current, daily } => {
            let table = RateTable::new(current);
            match daily {
                Some(daily) => table.with_daily(daily),
                None => table,
            }
        }
        RatesResponse::Flat(rates) => RateTable::new(rates),
    };

    table.validate()?;
    Ok(table)
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    #[instrument(skip(self))]
    async fn fetch_rates(&self) -> Result<RateTable> {
        debug!(url = %self.url, "Sending HTTP request to rates endpoint");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Échec de la requête HTTP vers l'endpoint /rates")?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, "Rates endpoint returned error status");
            anyhow::bail!("L'endpoint /rates a retourné une erreur : HTTP {}", status);
        }

        let body = response
            .text()
            .await
            .context("Échec de la lecture de la réponse /rates")?;

        let table = parse_rates_response(&body)?;
        info!(rates = table.len(), "Successfully fetched rates");
        Ok(table)
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
