//! Ledger service for client accounts and fund subscriptions

pub mod catalog;
pub mod config;
pub mod events;
pub mod models;
pub mod notification;
pub mod repository;
pub mod service;

pub use catalog::{FundCatalog, FundDefinition};
pub use config::{LedgerServiceConfig, NotificationConfig};
pub use events::{EventPublisher, LedgerEvent};
pub use models::*;
pub use notification::{
    DeliveryStatus, EmailSender, HttpEmailSender, NotificationDispatcher, NotificationService,
    Notifier, SmsSender, TwilioSmsSender,
};
pub use repository::Repositories;
pub use service::{LedgerService, RepositoryType, INITIAL_BALANCE};
