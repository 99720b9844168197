use std::fmt::{Display, Formatter};
use tokio::time::{sleep, Duration};

use crate::geo::Position;
use crate::session::SessionContext;

#[derive(Debug, Clone)]
pub enum SosError {
    NetworkTimeout,
    HttpError(u16),
    /// Every attempt failed; carries the attempt count.
    ExhaustedRetries(u32),
    UnknownError(String),
}

impl Display for SosError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SosError::NetworkTimeout => write!(f, "network timeout"),
            SosError::HttpError(code) => write!(f, "HTTP error: {}", code),
            SosError::ExhaustedRetries(n) => {
                write!(f, "SOS delivery failed after {} attempts", n)
            }
            SosError::UnknownError(msg) => write!(f, "unknown error: {}", msg),
        }
    }
}

impl std::error::Error for SosError {}

/// Sends emergency alerts to the backend.
///
/// # Retry Policy
/// - Fixed number of attempts with a fixed delay between them, no backoff
/// - Any non-success HTTP status counts as a failed attempt
#[derive(Clone)]
pub struct SosDispatcher {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl SosDispatcher {
    pub fn new(base_url: &str, max_attempts: u32, retry_delay_secs: u64) -> Self {
        SosDispatcher {
            client: super::build_client(),
            base_url: super::trim_base_url(base_url),
            max_attempts: max_attempts.max(1),
            retry_delay: Duration::from_secs(retry_delay_secs),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/alerte-sos.php", self.base_url)
    }

    fn build_form(
        session: &SessionContext,
        position: Position,
        message: &str,
        now_ms: u64,
    ) -> [(&'static str, String); 5] {
        [
            ("matricule", session.matricule.clone()),
            ("latitude", position.latitude.to_string()),
            ("longitude", position.longitude.to_string()),
            ("message", message.to_string()),
            ("horodatage", now_ms.to_string()),
        ]
    }

    /// Delivers one alert, retrying on failure per the policy above.
    pub async fn dispatch(
        &self,
        session: &SessionContext,
        position: Position,
        message: &str,
        now_ms: u64,
    ) -> Result<(), SosError> {
        let form = Self::build_form(session, position, message, now_ms);

        for attempt in 1..=self.max_attempts {
            match self.try_send(&form).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::warn!(
                        "SOS attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    if attempt < self.max_attempts {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(SosError::ExhaustedRetries(self.max_attempts))
    }

    async fn try_send(&self, form: &[(&'static str, String); 5]) -> Result<(), SosError> {
        let response = match self.client.post(self.endpoint()).form(form).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    return Err(SosError::NetworkTimeout);
                }
                return Err(SosError::UnknownError(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SosError::HttpError(status.as_u16()));
        }
        Ok(())
    }
}
