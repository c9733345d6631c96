//! Alarm email delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. Configuration
//! comes from the environment; without `SMTP_HOST` and `ALARM_RECIPIENT`,
//! [`EmailConfig::from_env`] returns `None` and no mailer is built.

use crate::bus::DomainEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@eagleeye.local";
const DEFAULT_SUBJECT: &str = "EagleEye alarm triggered";
const DEFAULT_BODY: &str = "An alarm zone has been entered.";

/// SMTP settings plus the fixed alarm recipient and message text.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Where alarm notifications go.
    pub recipient: String,
    pub subject: String,
    /// Message text; event details are appended below it.
    pub body: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable              | Required | Default                          |
    /// |-----------------------|----------|----------------------------------|
    /// | `SMTP_HOST`           | yes      | -                                |
    /// | `ALARM_RECIPIENT`     | yes      | -                                |
    /// | `SMTP_PORT`           | no       | `587`                            |
    /// | `SMTP_FROM`           | no       | `noreply@eagleeye.local`         |
    /// | `SMTP_USER`           | no       | -                                |
    /// | `SMTP_PASSWORD`       | no       | -                                |
    /// | `ALARM_EMAIL_SUBJECT` | no       | `EagleEye alarm triggered`       |
    /// | `ALARM_EMAIL_BODY`    | no       | `An alarm zone has been entered.`|
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let recipient = std::env::var("ALARM_RECIPIENT").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            recipient,
            subject: std::env::var("ALARM_EMAIL_SUBJECT")
                .unwrap_or_else(|_| DEFAULT_SUBJECT.to_string()),
            body: std::env::var("ALARM_EMAIL_BODY").unwrap_or_else(|_| DEFAULT_BODY.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends alarm notification emails.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn recipient(&self) -> &str {
        &self.config.recipient
    }

    /// Build the message for `event` without sending it.
    pub fn compose(&self, event: &DomainEvent) -> Result<lettre::Message, EmailError> {
        use lettre::message::header::ContentType;

        let body = format!(
            "{}\n\nEvent: {}\nTime: {}\nDetails: {}",
            self.config.body,
            event.event_type,
            event.timestamp,
            serde_json::to_string_pretty(&event.payload).unwrap_or_default()
        );

        lettre::Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.config.recipient.parse()?)
            .subject(self.config.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    /// Send the notification for `event` to the configured recipient.
    pub async fn deliver(&self, event: &DomainEvent) -> Result<(), EmailError> {
        use lettre::{
            transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport,
            Tokio1Executor,
        };

        let email = self.compose(event)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        tracing::info!(
            to = %self.config.recipient,
            event_type = %event.event_type,
            "Alarm email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(recipient: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.into(),
            smtp_user: None,
            smtp_password: None,
            recipient: recipient.into(),
            subject: "Intruder".into(),
            body: "Zone entered".into(),
        }
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn compose_uses_configured_subject_and_body() {
        let delivery = EmailDelivery::new(config("guard@example.com"));
        let event = DomainEvent::new("alarm.triggered")
            .with_payload(serde_json::json!({"alarm_id": "a-1"}));

        let message = delivery.compose(&event).expect("valid message");
        let raw = String::from_utf8(message.formatted()).expect("utf-8");
        assert!(raw.contains("Subject: Intruder"));
        assert!(raw.contains("To: guard@example.com"));
        assert!(raw.contains("Zone entered"));
        assert!(raw.contains("a-1"));
    }

    #[test]
    fn compose_rejects_bad_recipient() {
        let delivery = EmailDelivery::new(config("not-an-email"));
        let result = delivery.compose(&DomainEvent::new("alarm.triggered"));
        assert!(matches!(result, Err(EmailError::Address(_))));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
