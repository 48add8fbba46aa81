use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

/// Client for a transactional e-mail HTTP API (bearer key, JSON body).
#[derive(Clone)]
pub struct MailService {
    client: Client,
    config: MailConfig,
}

impl MailService {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub fn admin_email(&self) -> Option<&str> {
        self.config.admin_email.as_deref()
    }

    pub async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if !self.is_enabled() {
            log::debug!("Mail disabled, skipping \"{}\" to {}", message.subject, message.to);
            return Ok(());
        }

        let body = SendEmailRequest {
            from: &self.config.from,
            to: vec![message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Email sent: \"{}\" to {}", message.subject, message.to);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Email to {} failed: {}", message.to, error_text);
            Err(AppError::ExternalApiError(format!(
                "Email sending failed: {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_disabled_mailer_is_a_noop() {
        let mailer = MailService::new(MailConfig::default());
        assert!(!mailer.is_enabled());
        let message = EmailMessage {
            to: "a@example.fr".to_string(),
            subject: "Test".to_string(),
            html: "<p>Test</p>".to_string(),
        };
        assert!(mailer.send(&message).await.is_ok());
    }
}
