//! Donation receipt emails, sent best-effort over SMTP.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;

/// Sends formatted donation receipts. Failures are the caller's to log;
/// nothing here touches the donation row or the gateway response.
#[derive(Clone)]
pub struct ReceiptMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl ReceiptMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = SmtpTransport::relay(&config.host)
            .context("Failed to create SMTP relay")?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = config
            .from_address
            .parse::<Mailbox>()
            .context("Invalid receipt sender address")?;

        Ok(Self { transport, from })
    }

    /// Blocking send; run it on a blocking task from async handlers.
    pub fn send_receipt(
        &self,
        to: &str,
        donor_name: &str,
        amount: f64,
        currency: &str,
        reference: &str,
    ) -> Result<()> {
        let to: Mailbox = to.parse().context("Invalid recipient address")?;

        let body = format!(
            "Dear {donor_name},\n\n\
             Thank you for your donation of {currency} {amount:.2}.\n\
             Your payment reference is {reference}.\n\n\
             With gratitude,\n\
             The Foundation Team\n"
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Thank you for your donation")
            .body(body)
            .context("Failed to build receipt email")?;

        self.transport.send(&message).context("SMTP send failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from_address: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from_address: from_address.to_string(),
        }
    }

    #[test]
    fn builds_with_a_valid_sender() {
        assert!(ReceiptMailer::new(&config("Donations <donations@example.com>")).is_ok());
    }

    #[test]
    fn rejects_an_unparseable_sender() {
        assert!(ReceiptMailer::new(&config("not a mailbox")).is_err());
    }
}
