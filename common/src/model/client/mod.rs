//! Client models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Client model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Client {
    /// Caller-chosen client ID
    pub client_id: String,
    /// First name
    #[serde(alias = "nombre")]
    pub name: String,
    /// Surname(s)
    #[serde(alias = "apellidos")]
    pub surname: String,
    /// City of residence
    #[serde(alias = "ciudad")]
    pub city: String,
    /// Email address for notifications
    pub email: Option<String>,
    /// Phone number for SMS notifications
    pub phone: Option<String>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Create a new client stamped with the current time
    pub fn new(
        client_id: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
        city: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            surname: surname.into(),
            city: city.into(),
            email: email.filter(|e| !e.trim().is_empty()),
            phone: phone.filter(|p| !p.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}
