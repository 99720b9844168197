use serde::Deserialize;
use std::fmt::{Display, Formatter};

use super::wire;
use crate::geo::Position;
use crate::zones::DangerZone;

#[derive(Debug, Clone)]
pub enum ZoneFetchError {
    NetworkTimeout,
    HttpError(u16),
    ParseError(String),
    UnknownError(String),
}

impl Display for ZoneFetchError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ZoneFetchError::NetworkTimeout => write!(f, "network timeout"),
            ZoneFetchError::HttpError(code) => write!(f, "HTTP error: {}", code),
            ZoneFetchError::ParseError(msg) => write!(f, "parse error: {}", msg),
            ZoneFetchError::UnknownError(msg) => write!(f, "unknown error: {}", msg),
        }
    }
}

impl std::error::Error for ZoneFetchError {}

/// One zone row as the backend serves it.
#[derive(Debug, Deserialize)]
pub struct ZoneRecord {
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    pub latitude_zone: Option<f64>,
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    pub longitude_zone: Option<f64>,
    #[serde(default, deserialize_with = "wire::lenient_f64")]
    pub rayon_zone: Option<f64>,
    #[serde(default)]
    pub adresse_zone: String,
    #[serde(default)]
    pub observation_zone: String,
    #[serde(default)]
    pub couleur_zone: String,
    #[serde(default)]
    pub code_zone: String,
}

impl ZoneRecord {
    /// Wire shape into domain shape. Rows with missing or non-finite
    /// coordinates, or a non-positive radius, are rejected here so a bad
    /// row can never sit in the zone list silently matching nothing.
    pub fn validate(self) -> Result<DangerZone, String> {
        if self.code_zone.is_empty() {
            return Err("code_zone missing".to_string());
        }
        let latitude = self
            .latitude_zone
            .filter(|v| v.is_finite())
            .ok_or("latitude_zone missing or not a number")?;
        let longitude = self
            .longitude_zone
            .filter(|v| v.is_finite())
            .ok_or("longitude_zone missing or not a number")?;
        let radius_m = self
            .rayon_zone
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or("rayon_zone missing, not a number, or not positive")?;

        Ok(DangerZone {
            code: self.code_zone,
            center: Position::new(latitude, longitude),
            radius_m,
            label: self.adresse_zone,
            observation: self.observation_zone,
            color: self.couleur_zone,
        })
    }
}

/// Result of one registry fetch: the usable zones plus how many rows the
/// validation boundary turned away.
#[derive(Debug)]
pub struct ZoneBatch {
    pub zones: Vec<DangerZone>,
    pub rejected: usize,
}

/// Client for the danger-zone registry.
///
/// # Contract
/// - Single round-trip GET, no parameters, no pagination
/// - No automatic retry and no caching; callers re-fetch when they remount
/// - Invalid rows are skipped and counted, never propagated
pub struct ZoneFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl ZoneFetcher {
    pub fn new(base_url: &str) -> Self {
        ZoneFetcher {
            client: super::build_client(),
            base_url: super::trim_base_url(base_url),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/zone-dangereuse.php", self.base_url)
    }

    pub async fn fetch_zones(&self) -> Result<ZoneBatch, ZoneFetchError> {
        let response = match self.client.get(self.endpoint()).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    return Err(ZoneFetchError::NetworkTimeout);
                }
                return Err(ZoneFetchError::UnknownError(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ZoneFetchError::HttpError(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ZoneFetchError::UnknownError(format!("failed to read response: {}", e)))?;

        let records: Vec<ZoneRecord> =
            serde_json::from_str(&body).map_err(|e| ZoneFetchError::ParseError(e.to_string()))?;

        let mut zones = Vec::with_capacity(records.len());
        let mut rejected = 0usize;
        for record in records {
            let code = record.code_zone.clone();
            match record.validate() {
                Ok(zone) => zones.push(zone),
                Err(reason) => {
                    rejected += 1;
                    log::warn!("rejecting zone record '{}': {}", code, reason);
                }
            }
        }

        Ok(ZoneBatch { zones, rejected })
    }
}
