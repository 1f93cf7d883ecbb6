use crate::config::EmailConfig;
use crate::error::app_error::AppError;
use crate::models::alert::TriggerableAlert;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Outbound mail collaborator.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

pub type SharedMailer = Arc<dyn Mailer>;

/// Subject and plain-text body of a price alert notification.
pub fn alert_notification(alert: &TriggerableAlert) -> (String, String) {
    let subject = format!("Price Alert for {}", alert.crypto_name);
    let body = format!(
        r#"Hi {},

{} has reached your target price.

Target price: ${:.2}
Current price: ${:.2}

This alert has now been marked as triggered and will not be sent again.

Crypto Tracker
"#,
        alert.username, alert.crypto_name, alert.target_price, alert.current_price
    );

    (subject, body)
}

pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, AppError> {
        Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_address)
                    .parse()
                    .map_err(|e| AppError::email(format!("Invalid from address: {}", e)))?,
            )
            .to(to.parse().map_err(|e| AppError::email(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::email(format!("Failed to build email: {}", e)))
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::warn!(subject = %subject, "Email service is disabled, skipping email to {}", to);
            return Ok(());
        }

        let email = self.build_message(to, subject, body)?;

        let creds = Credentials::new(self.config.smtp_username.clone(), self.config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| AppError::email(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(creds)
            .port(self.config.smtp_port)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| AppError::email(format!("Failed to send email: {}", e)))?;

        tracing::info!(subject = %subject, "Email sent successfully to {}", to);
        Ok(())
    }
}
