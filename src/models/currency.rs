// ============================================================================
// Structures : CurrencyInfo & CurrencySet
// ============================================================================
// Représente les devises supportées par le wallet
//
// CONCEPTS RUST :
// 1. Vec ordonné : l'ordre du Vec = priorité d'affichage
// 2. Validation au constructeur : un CurrencySet est toujours cohérent
// 3. &str vs String : lookup par &str, stockage en String
// ============================================================================

use anyhow::{bail, Result};
use rust_decimal::Decimal;

/// Devises par défaut : (code, nom, décimales d'affichage)
///
/// L'ordre est celui de la priorité d'affichage (USDT en premier).
const DEFAULT_CURRENCIES: [(&str, &str, u8); 7] = [
    ("USDT", "Tether", 2),
    ("BTC", "Bitcoin", 6),
    ("ETH", "Ethereum", 6),
    ("SOL", "Solana", 4),
    ("TON", "Toncoin", 3),
    ("TRX", "Tron", 2),
    ("BLINK", "Blink", 4),
];

/// Métadonnées d'une devise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyInfo {
    /// Code de la devise (ex: "BTC"), sensible à la casse
    pub code: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// Nombre de décimales pour l'affichage
    pub decimals: u8,
}

impl CurrencyInfo {
    pub fn new(code: impl Into<String>, name: impl Into<String>, decimals: u8) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            decimals,
        }
    }

    /// Formatte un montant avec le nombre de décimales de la devise
    ///
    /// Format : "0.001250 BTC"
    ///
    /// CONCEPT RUST : {:.*}
    /// - La précision est passée en argument (usize) avant la valeur
    /// - Decimal respecte la précision demandée par le formatter
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!("{:.*} {}", self.decimals as usize, amount, self.code)
    }
}

/// Ensemble fixe et ordonné des devises supportées
///
/// CONCEPT RUST : Newtype pattern
/// - Encapsule un Vec<CurrencyInfo>
/// - Le constructeur garantit : non vide, pas de doublons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySet {
    currencies: Vec<CurrencyInfo>,
}

impl CurrencySet {
    /// Construit un ensemble à partir d'une liste de devises
    ///
    /// Refuse une liste vide ou contenant des codes en double.
    pub fn new(currencies: Vec<CurrencyInfo>) -> Result<Self> {
        if currencies.is_empty() {
            bail!("L'ensemble de devises ne peut pas être vide");
        }

        for (i, currency) in currencies.iter().enumerate() {
            if currency.code.trim().is_empty() {
                bail!("Code de devise vide à la position {}", i);
            }
            if currencies[..i].iter().any(|c| c.code == currency.code) {
                bail!("Code de devise en double : {}", currency.code);
            }
        }

        Ok(Self { currencies })
    }

    /// Construit un ensemble à partir de codes seuls
    ///
    /// Les codes connus reprennent les métadonnées par défaut,
    /// les autres utilisent le code comme nom et 2 décimales.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        let currencies = codes
            .iter()
            .map(|code| {
                let code = code.as_ref();
                DEFAULT_CURRENCIES
                    .iter()
                    .find(|(c, _, _)| *c == code)
                    .map(|&(c, name, decimals)| CurrencyInfo::new(c, name, decimals))
                    .unwrap_or_else(|| CurrencyInfo::new(code, code, 2))
            })
            .collect();

        Self::new(currencies)
    }

    /// Vérifie si un code fait partie de l'ensemble
    pub fn contains(&self, code: &str) -> bool {
        self.currencies.iter().any(|c| c.code == code)
    }

    /// Retourne les métadonnées d'une devise
    pub fn get(&self, code: &str) -> Option<&CurrencyInfo> {
        self.currencies.iter().find(|c| c.code == code)
    }

    /// Retourne la devise à une position donnée (ordre de priorité)
    pub fn get_index(&self, index: usize) -> Option<&CurrencyInfo> {
        self.currencies.get(index)
    }

    /// Itère sur les devises dans l'ordre de priorité
    pub fn iter(&self) -> impl Iterator<Item = &CurrencyInfo> {
        self.currencies.iter()
    }

    /// Itère sur les codes dans l'ordre de priorité
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.currencies.iter().map(|c| c.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

impl Default for CurrencySet {
    fn default() -> Self {
        Self {
            currencies: DEFAULT_CURRENCIES
                .iter()
                .map(|&(code, name, decimals)| CurrencyInfo::new(code, name, decimals))
                .collect(),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
