//! Ledger events
//!
//! Every committed mutation is announced as a [`LedgerEvent`] on an unbounded
//! channel. Publishing is fire-and-forget so a slow or missing consumer never
//! affects the mutation that produced the event.

use common::decimal::Amount;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A committed ledger mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    ClientCreated {
        client_id: String,
        name: String,
        initial_balance: Amount,
    },
    Deposited {
        client_id: String,
        amount: Amount,
        new_balance: Amount,
    },
    Subscribed {
        client_id: String,
        fund_id: String,
        fund_name: String,
        amount: Amount,
        new_balance: Amount,
    },
    Cancelled {
        client_id: String,
        fund_id: String,
        fund_name: String,
        refunded: Amount,
        new_balance: Amount,
    },
}

impl LedgerEvent {
    /// Client the event concerns
    pub fn client_id(&self) -> &str {
        match self {
            LedgerEvent::ClientCreated { client_id, .. }
            | LedgerEvent::Deposited { client_id, .. }
            | LedgerEvent::Subscribed { client_id, .. }
            | LedgerEvent::Cancelled { client_id, .. } => client_id,
        }
    }

    /// Notification subject line
    pub fn subject(&self) -> &'static str {
        match self {
            LedgerEvent::ClientCreated { .. } => "Welcome - your account was created",
            LedgerEvent::Deposited { .. } => "Deposit received",
            LedgerEvent::Subscribed { .. } => "Fund subscription confirmed",
            LedgerEvent::Cancelled { .. } => "Fund subscription cancelled",
        }
    }

    /// Notification body
    pub fn message(&self) -> String {
        match self {
            LedgerEvent::ClientCreated { client_id, name, initial_balance } => format!(
                "Hello {}, your client account {} was created with an initial balance of COP {}.",
                name, client_id, initial_balance
            ),
            LedgerEvent::Deposited { amount, new_balance, .. } => format!(
                "A deposit of COP {} was credited to your account. New balance: COP {}.",
                amount, new_balance
            ),
            LedgerEvent::Subscribed { fund_id, fund_name, amount, new_balance, .. } => format!(
                "You subscribed to fund {} (ID {}) for COP {}. Available balance: COP {}.",
                fund_name, fund_id, amount, new_balance
            ),
            LedgerEvent::Cancelled { fund_id, fund_name, refunded, new_balance, .. } => format!(
                "Your subscription to fund {} (ID {}) was cancelled and COP {} refunded. New balance: COP {}.",
                fund_name, fund_id, refunded, new_balance
            ),
        }
    }
}

/// Sending half of the event channel
#[derive(Debug, Clone, Default)]
pub struct EventPublisher {
    sender: Option<mpsc::UnboundedSender<LedgerEvent>>,
}

impl EventPublisher {
    /// Create a publisher together with the receiver that consumes it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LedgerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender: Some(sender) }, receiver)
    }

    /// A publisher that discards every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Announce an event
    pub fn publish(&self, event: LedgerEvent) {
        match &self.sender {
            Some(sender) => {
                if let Err(e) = sender.send(event) {
                    warn!("Event channel closed, dropping {:?}", e.0);
                }
            }
            None => debug!("Events disabled, dropping {:?}", event),
        }
    }
}
