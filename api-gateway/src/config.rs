//! Application configuration

use std::env;

use ledger_service::{LedgerServiceConfig, NotificationConfig};

/// Store backend for the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

/// Application configuration
pub struct AppConfig {
    /// API port
    pub port: u16,
    /// Store backend
    pub store: StoreKind,
    /// Load the fund catalog on startup
    pub initialize_on_start: bool,
    /// Ledger settings
    pub ledger: LedgerServiceConfig,
    /// Notification settings
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        let store = match env::var("STORE").map(|s| s.to_lowercase()) {
            Ok(s) if s == "postgres" => StoreKind::Postgres,
            _ => StoreKind::Memory,
        };

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            store,
            initialize_on_start: env::var("INITIALIZE_ON_START")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(store == StoreKind::Memory),
            ledger: LedgerServiceConfig::from_env(),
            notifications: NotificationConfig::from_env(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
