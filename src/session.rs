use serde::{Deserialize, Serialize};

/// Identity of the signed-in user, passed explicitly to every component
/// that talks to the backend. Nothing reads it from ambient storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionContext {
    /// Backend-issued account identifier.
    pub matricule: String,
    pub display_name: String,
}

impl SessionContext {
    pub fn new(matricule: &str, display_name: &str) -> Self {
        SessionContext {
            matricule: matricule.to_string(),
            display_name: display_name.to_string(),
        }
    }
}
