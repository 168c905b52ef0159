use async_trait::async_trait;
use lettre::message::{header, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::plugins::traits::Notifier;
use crate::utils::error::{AppError, Result};

pub struct EmailNotifier {
    config: EmailConfig,
}

/// Sender, recipient and login resolved from the configuration.
struct Envelope {
    from: Mailbox,
    to: Mailbox,
    credentials: Credentials,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        EmailNotifier { config }
    }

    fn envelope(&self) -> Result<Envelope> {
        let from_address = self
            .config
            .from_address
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Email("Email credentials not configured: missing sender address".into()))?;
        let password = self
            .config
            .password
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Email("Email credentials not configured: missing password".into()))?;
        let to_address = self.config.recipient().map(str::trim).unwrap_or(from_address);

        let from: Mailbox = from_address
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid sender address '{}': {}", from_address, e)))?;
        let to: Mailbox = to_address
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient address '{}': {}", to_address, e)))?;

        Ok(Envelope {
            from,
            to,
            credentials: Credentials::new(from_address.to_string(), password.to_string()),
        })
    }

    fn build_message(envelope: &Envelope, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(envelope.from.clone())
            .to(envelope.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Email(format!("Failed to build message: {}", e)))
    }

    fn mailer(&self, credentials: Credentials) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        // Submission port with a STARTTLS upgrade before AUTH.
        Ok(AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| AppError::Email(format!("Invalid SMTP relay '{}': {}", self.config.smtp_host, e)))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build())
    }

    async fn try_send(&self, subject: &str, body: &str) -> Result<()> {
        let envelope = self.envelope()?;
        let email = Self::build_message(&envelope, subject, body)?;

        tracing::info!("Sending email to: {}", envelope.to);
        self.mailer(envelope.credentials)?
            .send(email)
            .await
            .map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;
        Ok(())
    }

    async fn try_test_connection(&self) -> Result<bool> {
        let envelope = self.envelope()?;
        self.mailer(envelope.credentials)?
            .test_connection()
            .await
            .map_err(|e| AppError::Email(format!("SMTP handshake failed: {}", e)))
    }

    /// Fixed diagnostic message to confirm end-to-end delivery.
    pub async fn send_test_email(&self) -> bool {
        self.send("Test Email", "Test email from restock-watcher.").await
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, subject: &str, body: &str) -> bool {
        match self.try_send(subject, body).await {
            Ok(()) => {
                tracing::info!("Email sent successfully");
                true
            }
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    async fn test_connection(&self) -> bool {
        match self.try_test_connection().await {
            Ok(true) => {
                tracing::info!("SMTP login to {} succeeded", self.config.smtp_host);
                true
            }
            Ok(false) => {
                tracing::error!("SMTP server {} refused the connection test", self.config.smtp_host);
                false
            }
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }
}
