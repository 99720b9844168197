pub mod market;
pub mod sos;
pub mod zones;

pub use market::{CaisseEntry, EntryDirection, Listing, MarketClient, MarketError};
pub use sos::{SosDispatcher, SosError};
pub use zones::{ZoneBatch, ZoneFetchError, ZoneFetcher};

use std::time::Duration;

const HTTP_TIMEOUT_SECS: u64 = 30;

pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent("SafetyTracker/0.1.0")
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Helpers for the loosely typed payloads the PHP backend delivers.
pub(crate) mod wire {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    /// Numeric columns arrive as JSON numbers or as numeric strings
    /// depending on the database driver. Anything unparseable becomes
    /// None and is handled at the validation boundary.
    pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<NumberOrText>::deserialize(deserializer)?;
        Ok(match value {
            None => None,
            Some(NumberOrText::Number(n)) => Some(n),
            Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok(),
        })
    }
}
