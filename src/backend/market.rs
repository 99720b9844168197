use serde::Deserialize;
use std::fmt::{Display, Formatter};

use super::wire;
use crate::session::SessionContext;

#[derive(Debug, Clone)]
pub enum MarketError {
    NetworkTimeout,
    HttpError(u16),
    ParseError(String),
    UnknownError(String),
}

impl Display for MarketError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            MarketError::NetworkTimeout => write!(f, "network timeout"),
            MarketError::HttpError(code) => write!(f, "HTTP error: {}", code),
            MarketError::ParseError(msg) => write!(f, "parse error: {}", msg),
            MarketError::UnknownError(msg) => write!(f, "unknown error: {}", msg),
        }
    }
}

impl std::error::Error for MarketError {}

/// A classifieds listing.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub seller_matricule: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
struct ListingRecord {
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    id_annonce: Option<f64>,
    #[serde(default)]
    titre_annonce: String,
    #[serde(default)]
    description_annonce: String,
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    prix_annonce: Option<f64>,
    #[serde(default)]
    matricule_vendeur: String,
    #[serde(default)]
    telephone_vendeur: String,
}

impl ListingRecord {
    fn validate(self) -> Result<Listing, String> {
        let id = self
            .id_annonce
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or("id_annonce missing or not a number")? as u64;
        let price = self
            .prix_annonce
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or("prix_annonce missing or not a number")?;
        if self.titre_annonce.is_empty() {
            return Err("titre_annonce missing".to_string());
        }
        Ok(Listing {
            id,
            title: self.titre_annonce,
            description: self.description_annonce,
            price,
            seller_matricule: self.matricule_vendeur,
            phone: self.telephone_vendeur,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryDirection {
    Debit,
    Credit,
}

/// One row of the transaction ledger.
#[derive(Debug, Clone)]
pub struct CaisseEntry {
    pub label: String,
    pub amount: f64,
    pub direction: EntryDirection,
    pub timestamp_ms: u64,
}

#[derive(Debug, Deserialize)]
struct CaisseRecord {
    #[serde(default)]
    libelle_caisse: String,
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    montant_caisse: Option<f64>,
    #[serde(default)]
    sens_caisse: String,
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    horodatage_caisse: Option<f64>,
}

impl CaisseRecord {
    fn validate(self) -> Result<CaisseEntry, String> {
        let amount = self
            .montant_caisse
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or("montant_caisse missing or not a number")?;
        let direction = match self.sens_caisse.to_ascii_lowercase().as_str() {
            "credit" => EntryDirection::Credit,
            "debit" => EntryDirection::Debit,
            other => return Err(format!("sens_caisse unrecognized: '{}'", other)),
        };
        let timestamp_ms = self
            .horodatage_caisse
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0) as u64;
        Ok(CaisseEntry {
            label: self.libelle_caisse,
            amount,
            direction,
            timestamp_ms,
        })
    }
}

/// Running balance over ledger entries: credits minus debits.
pub fn balance(entries: &[CaisseEntry]) -> f64 {
    entries.iter().fold(0.0, |acc, entry| match entry.direction {
        EntryDirection::Credit => acc + entry.amount,
        EntryDirection::Debit => acc - entry.amount,
    })
}

/// Client for the classifieds and ledger endpoints. Plain CRUD: fetch a
/// list, post a row, no pagination, no caching. Invalid rows are skipped
/// and logged like everywhere else on the wire boundary.
pub struct MarketClient {
    client: reqwest::Client,
    base_url: String,
}

impl MarketClient {
    pub fn new(base_url: &str) -> Self {
        MarketClient {
            client: super::build_client(),
            base_url: super::trim_base_url(base_url),
        }
    }

    fn listings_endpoint(&self) -> String {
        format!("{}/annonces.php", self.base_url)
    }

    fn ledger_endpoint(&self) -> String {
        format!("{}/caisses.php", self.base_url)
    }

    pub async fn fetch_listings(&self) -> Result<Vec<Listing>, MarketError> {
        let body = self.get_text(self.listings_endpoint()).await?;
        let records: Vec<ListingRecord> =
            serde_json::from_str(&body).map_err(|e| MarketError::ParseError(e.to_string()))?;
        Ok(Self::keep_valid(records, ListingRecord::validate, "listing"))
    }

    pub async fn publish_listing(
        &self,
        session: &SessionContext,
        title: &str,
        description: &str,
        price: f64,
        phone: &str,
    ) -> Result<(), MarketError> {
        let form = [
            ("matricule_vendeur", session.matricule.clone()),
            ("titre_annonce", title.to_string()),
            ("description_annonce", description.to_string()),
            ("prix_annonce", price.to_string()),
            ("telephone_vendeur", phone.to_string()),
        ];
        self.post_form(self.listings_endpoint(), &form).await
    }

    pub async fn fetch_ledger(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<CaisseEntry>, MarketError> {
        let url = format!(
            "{}?matricule={}",
            self.ledger_endpoint(),
            session.matricule
        );
        let body = self.get_text(url).await?;
        let records: Vec<CaisseRecord> =
            serde_json::from_str(&body).map_err(|e| MarketError::ParseError(e.to_string()))?;
        Ok(Self::keep_valid(records, CaisseRecord::validate, "ledger entry"))
    }

    pub async fn record_entry(
        &self,
        session: &SessionContext,
        label: &str,
        amount: f64,
        direction: EntryDirection,
        now_ms: u64,
    ) -> Result<(), MarketError> {
        let sens = match direction {
            EntryDirection::Credit => "credit",
            EntryDirection::Debit => "debit",
        };
        let form = [
            ("matricule", session.matricule.clone()),
            ("libelle_caisse", label.to_string()),
            ("montant_caisse", amount.to_string()),
            ("sens_caisse", sens.to_string()),
            ("horodatage_caisse", now_ms.to_string()),
        ];
        self.post_form(self.ledger_endpoint(), &form).await
    }

    fn keep_valid<R, T>(
        records: Vec<R>,
        validate: fn(R) -> Result<T, String>,
        what: &str,
    ) -> Vec<T> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match validate(record) {
                Ok(item) => out.push(item),
                Err(reason) => log::warn!("rejecting {}: {}", what, reason),
            }
        }
        out
    }

    async fn get_text(&self, url: String) -> Result<String, MarketError> {
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    return Err(MarketError::NetworkTimeout);
                }
                return Err(MarketError::UnknownError(e.to_string()));
            }
        };
        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::HttpError(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| MarketError::UnknownError(format!("failed to read response: {}", e)))
    }

    async fn post_form(
        &self,
        url: String,
        form: &[(&'static str, String); 5],
    ) -> Result<(), MarketError> {
        let response = match self.client.post(url).form(form).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    return Err(MarketError::NetworkTimeout);
                }
                return Err(MarketError::UnknownError(e.to_string()));
            }
        };
        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::HttpError(status.as_u16()));
        }
        Ok(())
    }
}
