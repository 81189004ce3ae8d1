//! Notification port. The primary operations never depend on an email
//! getting through: callers either spawn the send and forget it, or await
//! it only to fill an advisory `emailSent` flag.

pub mod templates;

use anyhow::{Result, bail};
use tracing::info;

/// A rendered message, ready to hand to whatever delivers it.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery backend. `Http` posts to a mail-gateway endpoint; `Log` is the
/// dev-mode stand-in that just records the send.
#[derive(Clone)]
pub enum Mailer {
    Http(HttpMailer),
    Log,
}

#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl Mailer {
    /// `RRE_MAIL_ENDPOINT` selects the HTTP gateway; without it every send
    /// is logged and reported as successful.
    pub fn from_env() -> Self {
        match std::env::var("RRE_MAIL_ENDPOINT") {
            Ok(endpoint) => {
                let from = std::env::var("RRE_MAIL_FROM")
                    .unwrap_or_else(|_| "contact@rencontres-export.ma".into());
                Mailer::Http(HttpMailer {
                    client: reqwest::Client::new(),
                    endpoint,
                    from,
                })
            }
            Err(_) => Mailer::Log,
        }
    }

    pub async fn send(&self, email: OutboundEmail) -> Result<()> {
        match self {
            Mailer::Http(mailer) => mailer.send(email).await,
            Mailer::Log => {
                info!(to = %email.to, subject = %email.subject, "Email (log mailer, not delivered)");
                Ok(())
            }
        }
    }
}

impl HttpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "from": self.from,
                "to": email.to,
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Mail gateway returned {}", response.status());
        }
        info!(to = %email.to, subject = %email.subject, "Email accepted by gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = Mailer::Log;
        let outcome = mailer
            .send(OutboundEmail {
                to: "jane@acme.ma".into(),
                subject: "test".into(),
                html: "<p>test</p>".into(),
            })
            .await;
        assert!(outcome.is_ok());
    }
}
