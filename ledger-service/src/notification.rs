//! Client notifications
//!
//! Notifications are best effort. Channels report a [`DeliveryStatus`] that
//! is logged and dropped; nothing here can fail a ledger operation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{EmailConfig, NotificationConfig, SmsConfig};
use crate::events::LedgerEvent;
use crate::repository::ClientRepository;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub delivered: bool,
    /// Provider message ID on success, reason otherwise
    pub info: String,
}

impl DeliveryStatus {
    pub fn delivered(info: impl Into<String>) -> Self {
        Self {
            delivered: true,
            info: info.into(),
        }
    }

    pub fn failed(info: impl Into<String>) -> Self {
        Self {
            delivered: false,
            info: info.into(),
        }
    }
}

/// Sends a notification to a client
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, client_id: &str, subject: &str, message: &str);
}

/// Email channel
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> DeliveryStatus;
}

/// SMS channel
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> DeliveryStatus;
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Email delivery through an HTTP mail relay accepting JSON
/// (SendGrid v3 `mail/send` body shape)
pub struct HttpEmailSender {
    enabled: bool,
    config: EmailConfig,
    client: reqwest::Client,
}

impl HttpEmailSender {
    pub fn new(enabled: bool, config: EmailConfig) -> Self {
        Self {
            enabled,
            config,
            client: http_client(),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> DeliveryStatus {
        if !self.enabled {
            return DeliveryStatus::failed("Notifications disabled");
        }
        if to.trim().is_empty() {
            return DeliveryStatus::failed("Missing recipient email");
        }
        let (Some(url), Some(key), Some(from)) = (
            self.config.api_url.as_deref(),
            self.config.api_key.as_deref(),
            self.config.from_address.as_deref(),
        ) else {
            return DeliveryStatus::failed("Email relay is not configured");
        };

        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": from },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        debug!("Sending email to {}", to);
        match self.client.post(url).bearer_auth(key).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                let id = response
                    .headers()
                    .get("x-message-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("accepted")
                    .to_string();
                DeliveryStatus::delivered(id)
            }
            Ok(response) => DeliveryStatus::failed(format!("Email relay returned {}", response.status())),
            Err(e) => DeliveryStatus::failed(format!("Email relay unreachable: {}", e)),
        }
    }
}

/// SMS delivery through the Twilio Messages API
pub struct TwilioSmsSender {
    enabled: bool,
    config: SmsConfig,
    client: reqwest::Client,
}

impl TwilioSmsSender {
    pub fn new(enabled: bool, config: SmsConfig) -> Self {
        Self {
            enabled,
            config,
            client: http_client(),
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send_sms(&self, to: &str, body: &str) -> DeliveryStatus {
        if !self.enabled {
            return DeliveryStatus::failed("Notifications disabled");
        }
        if to.trim().is_empty() {
            return DeliveryStatus::failed("Missing recipient phone number");
        }
        let (Some(sid), Some(token), Some(from)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
            self.config.from_number.as_deref(),
        ) else {
            return DeliveryStatus::failed("Twilio is not configured");
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            sid
        );

        debug!("Sending SMS to {}", to);
        let response = match self
            .client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DeliveryStatus::failed(format!("Twilio unreachable: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return DeliveryStatus::failed(format!("Twilio returned {}", status));
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => DeliveryStatus::delivered(
                body.get("sid")
                    .and_then(|s| s.as_str())
                    .unwrap_or("queued")
                    .to_string(),
            ),
            Err(_) => DeliveryStatus::delivered("queued"),
        }
    }
}

/// Looks the client up and sends on every channel it has contact data for
pub struct NotificationService {
    clients: Arc<dyn ClientRepository>,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
}

impl NotificationService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        Self { clients, email, sms }
    }

    /// Email and SMS senders built from `config`
    pub fn with_config(clients: Arc<dyn ClientRepository>, config: &NotificationConfig) -> Self {
        Self::new(
            clients,
            Arc::new(HttpEmailSender::new(config.enabled, config.email.clone())),
            Arc::new(TwilioSmsSender::new(config.enabled, config.sms.clone())),
        )
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn notify(&self, client_id: &str, subject: &str, message: &str) {
        let client = match self.clients.get(client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => {
                warn!("Client {} not found, skipping notification", client_id);
                return;
            }
            Err(e) => {
                warn!("Could not load client {} for notification: {}", client_id, e);
                return;
            }
        };

        if let Some(email) = client.email.as_deref() {
            let status = self.email.send_email(email, subject, message).await;
            if status.delivered {
                info!("Email sent to client {}: {}", client_id, status.info);
            } else {
                warn!("Email to client {} not sent: {}", client_id, status.info);
            }
        }

        if let Some(phone) = client.phone.as_deref() {
            let status = self.sms.send_sms(phone, message).await;
            if status.delivered {
                info!("SMS sent to client {}: {}", client_id, status.info);
            } else {
                warn!("SMS to client {} not sent: {}", client_id, status.info);
            }
        }
    }
}

/// Feeds ledger events to a notifier, one at a time
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Consume events until every publisher is dropped
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<LedgerEvent>) {
        while let Some(event) = events.recv().await {
            debug!("Dispatching {:?}", event);
            self.notifier
                .notify(event.client_id(), event.subject(), &event.message())
                .await;
        }
        info!("Event channel closed, notification dispatcher stopped");
    }

    /// Run on a background task
    pub fn spawn(self, events: mpsc::UnboundedReceiver<LedgerEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }
}
