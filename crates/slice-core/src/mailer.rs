//! Outbound email. The backend only needs `send(to, template)`; delivery is
//! pluggable.
//!
//! - [`LogMailer`] renders and logs the message (default when no relay is configured)
//! - [`HttpMailer`] posts the rendered message to an HTTP mail relay
//! - [`MemoryMailer`] keeps messages in memory for tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::models::cents_to_amount;

const BRAND: &str = "Slice Chill";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("mail relay rejected message with status {0}")]
    Rejected(u16),
}

/// A line in an order-confirmation email.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_name: String,
    pub quantity: i32,
    pub subtotal_cents: i64,
}

/// Email templates together with the data they render.
#[derive(Debug, Clone)]
pub enum EmailTemplate {
    Verification {
        username: String,
        link: String,
        expires_in_secs: u64,
    },
    PasswordReset {
        username: String,
        link: String,
        expires_in_secs: u64,
    },
    OrderConfirmation {
        username: String,
        order_id: i32,
        status: String,
        delivery_address: String,
        lines: Vec<OrderLine>,
        total_cents: i64,
    },
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::Verification { .. } => "verification",
            EmailTemplate::PasswordReset { .. } => "password_reset",
            EmailTemplate::OrderConfirmation { .. } => "order_confirmation",
        }
    }

    /// The action link carried by the email, if any.
    pub fn link(&self) -> Option<&str> {
        match self {
            EmailTemplate::Verification { link, .. } | EmailTemplate::PasswordReset { link, .. } => {
                Some(link)
            }
            EmailTemplate::OrderConfirmation { .. } => None,
        }
    }

    pub fn render(&self) -> RenderedEmail {
        match self {
            EmailTemplate::Verification {
                username,
                link,
                expires_in_secs,
            } => RenderedEmail {
                subject: format!("Verify Your Email - {BRAND}"),
                text: format!(
                    "Welcome, {username}!\n\n\
                     Thank you for registering with {BRAND}. Please verify your email address:\n\n\
                     {link}\n\n\
                     This link will expire in {}.\n\
                     If you didn't create an account with us, please ignore this email.",
                    describe_lifetime(*expires_in_secs)
                ),
            },
            EmailTemplate::PasswordReset {
                username,
                link,
                expires_in_secs,
            } => RenderedEmail {
                subject: format!("Reset Your Password - {BRAND}"),
                text: format!(
                    "Hi {username},\n\n\
                     We received a request to reset your password. Open the link below to choose a new one:\n\n\
                     {link}\n\n\
                     This link will expire in {}.\n\
                     If you didn't request a password reset, ignore this email; your password stays unchanged.",
                    describe_lifetime(*expires_in_secs)
                ),
            },
            EmailTemplate::OrderConfirmation {
                username,
                order_id,
                status,
                delivery_address,
                lines,
                total_cents,
            } => {
                let mut text = format!(
                    "Thank you for your order, {username}!\n\n\
                     Order Number: #{order_id}\n\
                     Status: {status}\n"
                );
                if !delivery_address.is_empty() {
                    text.push_str(&format!("Delivery Address: {delivery_address}\n"));
                }
                text.push_str("\nOrder Items:\n");
                for line in lines {
                    text.push_str(&format!(
                        "  {} x {}  ${:.2}\n",
                        line.product_name,
                        line.quantity,
                        cents_to_amount(line.subtotal_cents)
                    ));
                }
                text.push_str(&format!(
                    "\nTotal Amount: ${:.2}\n",
                    cents_to_amount(*total_cents)
                ));
                RenderedEmail {
                    subject: format!("Order Confirmation #{order_id} - {BRAND}"),
                    text,
                }
            }
        }
    }
}

/// Human wording for a link lifetime, in the largest whole unit.
fn describe_lifetime(secs: u64) -> String {
    let (amount, unit) = if secs >= 86_400 && secs % 86_400 == 0 {
        (secs / 86_400, "day")
    } else if secs >= 3_600 && secs % 3_600 == 0 {
        (secs / 3_600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Delivery capability used by the auth and order services.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), MailError>;
}

/// Build the mailer selected by configuration.
pub fn from_config(config: &Config) -> Arc<dyn Mailer> {
    match &config.mail_api_url {
        Some(url) => {
            tracing::info!("Delivering email through relay at {}", url);
            Arc::new(HttpMailer::new(url.clone(), config.mail_from.clone()))
        }
        None => {
            tracing::info!("No MAIL_API_URL configured, emails will be logged only");
            Arc::new(LogMailer)
        }
    }
}

/// Logs every message instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), MailError> {
        let rendered = template.render();
        tracing::info!(
            to,
            template = template.name(),
            subject = %rendered.subject,
            "email not delivered (log mailer)"
        );
        tracing::debug!(to, body = %rendered.text, "email body");
        Ok(())
    }
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    template: &'static str,
    subject: &'a str,
    text: &'a str,
}

/// Posts rendered messages as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, from: String) -> Self {
        HttpMailer {
            client: reqwest::Client::new(),
            endpoint,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), MailError> {
        let rendered = template.render();
        let message = RelayMessage {
            from: &self.from,
            to,
            template: template.name(),
            subject: &rendered.subject,
            text: &rendered.text,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MailError::Rejected(res.status().as_u16()));
        }

        tracing::info!(to, template = template.name(), "email sent");
        Ok(())
    }
}

/// A message captured by [`MemoryMailer`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub template: EmailTemplate,
}

impl SentEmail {
    /// The last path segment of the action link, i.e. the raw token for
    /// verification and reset emails.
    pub fn token(&self) -> Option<String> {
        self.template
            .link()
            .and_then(|link| link.rsplit('/').next())
            .map(str::to_string)
    }
}

/// Records messages in memory. Used by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent message sent to `to`.
    pub fn last_to(&self, to: &str) -> Option<SentEmail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, template: EmailTemplate) -> Result<(), MailError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError::Transport("mailbox poisoned".to_string()))?;
        sent.push(SentEmail {
            to: to.to_string(),
            template,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_carries_link() {
        let template = EmailTemplate::Verification {
            username: "mario".to_string(),
            link: "http://localhost:3000/verify-email/abc".to_string(),
            expires_in_secs: 172_800,
        };
        let rendered = template.render();
        assert!(rendered.subject.starts_with("Verify Your Email"));
        assert!(rendered.text.contains("http://localhost:3000/verify-email/abc"));
        assert!(rendered.text.contains("This link will expire in 2 days."));
        assert_eq!(template.link(), Some("http://localhost:3000/verify-email/abc"));
    }

    #[test]
    fn reset_email_states_configured_lifetime() {
        let template = EmailTemplate::PasswordReset {
            username: "peach".to_string(),
            link: "http://localhost:3000/reset-password/abc".to_string(),
            expires_in_secs: 1_800,
        };
        assert!(template
            .render()
            .text
            .contains("This link will expire in 30 minutes."));
    }

    #[test]
    fn lifetimes_use_largest_whole_unit() {
        assert_eq!(describe_lifetime(86_400), "1 day");
        assert_eq!(describe_lifetime(3_600), "1 hour");
        assert_eq!(describe_lifetime(5_400), "90 minutes");
        assert_eq!(describe_lifetime(45), "45 seconds");
    }

    #[test]
    fn order_confirmation_lists_items_and_total() {
        let template = EmailTemplate::OrderConfirmation {
            username: "luigi".to_string(),
            order_id: 7,
            status: "Placed".to_string(),
            delivery_address: "1 Main St".to_string(),
            lines: vec![OrderLine {
                product_name: "Margherita Pizza".to_string(),
                quantity: 2,
                subtotal_cents: 2598,
            }],
            total_cents: 2598,
        };
        let rendered = template.render();
        assert_eq!(rendered.subject, "Order Confirmation #7 - Slice Chill");
        assert!(rendered.text.contains("Margherita Pizza x 2  $25.98"));
        assert!(rendered.text.contains("Total Amount: $25.98"));
        assert!(rendered.text.contains("Delivery Address: 1 Main St"));
        assert_eq!(template.link(), None);
    }

    #[tokio::test]
    async fn memory_mailer_records_and_extracts_token() {
        let mailer = MemoryMailer::new();
        mailer
            .send(
                "a@b.com",
                EmailTemplate::PasswordReset {
                    username: "a".to_string(),
                    link: "http://x/reset-password/deadbeef".to_string(),
                    expires_in_secs: 3_600,
                },
            )
            .await
            .unwrap();

        let last = mailer.last_to("a@b.com").unwrap();
        assert_eq!(last.token().as_deref(), Some("deadbeef"));
        assert!(mailer.last_to("other@b.com").is_none());
    }
}
