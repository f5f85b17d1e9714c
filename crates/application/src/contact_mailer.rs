//! Contact email composition and the outbound transport port.
//!
//! Builds the subject, an HTML body, and a plain-text fallback from a
//! validated submission, then hands the message to a transport. All
//! user-supplied fields are HTML-escaped before interpolation so a
//! submission cannot inject markup into the relayed email.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use postbox_core::AppResult;
use postbox_domain::ContactSubmission;

/// Port for delivering a composed email. Infrastructure provides SMTP or
/// console implementations.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers the email in a single attempt. No retries: a failure here
    /// fails the whole submission.
    async fn deliver(&self, email: &OutboundEmail) -> AppResult<DispatchReceipt>;
}

/// A fully composed email ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Sender address (the relay account).
    pub from: String,
    /// Recipient address (the site owner).
    pub to: String,
    /// Reply-to address, set to the submitter so replies route back to
    /// them rather than to the relay account.
    pub reply_to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text fallback body.
    pub text_body: String,
    /// HTML body with escaped user content.
    pub html_body: String,
}

/// Delivery confirmation from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// Message identifier assigned at dispatch time.
    pub message_id: String,
}

/// Application service that formats and dispatches contact emails.
#[derive(Clone)]
pub struct ContactMailer {
    transport: Arc<dyn MailTransport>,
    from_address: String,
    to_address: String,
}

impl ContactMailer {
    /// Creates a new contact mailer.
    #[must_use]
    pub fn new(
        transport: Arc<dyn MailTransport>,
        from_address: impl Into<String>,
        to_address: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            from_address: from_address.into(),
            to_address: to_address.into(),
        }
    }

    /// Composes the contact email for a validated submission and hands it
    /// to the transport.
    pub async fn send_contact_email(
        &self,
        submission: &ContactSubmission,
    ) -> AppResult<DispatchReceipt> {
        let email = OutboundEmail {
            from: self.from_address.clone(),
            to: self.to_address.clone(),
            reply_to: submission.email().to_owned(),
            subject: format!("New contact from {} - Portfolio", submission.name()),
            text_body: text_body(submission),
            html_body: html_body(submission),
        };

        self.transport.deliver(&email).await
    }
}

fn html_body(submission: &ContactSubmission) -> String {
    let name = escape_html(submission.name());
    let email = escape_html(submission.email());
    let message = escape_html(submission.message()).replace('\n', "<br>");

    format!(
        "<div style=\"font-family: Arial, sans-serif; padding: 20px;\">\
         <h2>New Contact Form Submission</h2>\
         <p><strong>Name:</strong> {name}</p>\
         <p><strong>Email:</strong> {email}</p>\
         <p><strong>Message:</strong></p>\
         <div style=\"background: #f5f5f5; padding: 15px; border-radius: 4px;\">{message}</div>\
         <p style=\"margin-top: 20px; color: #666; font-size: 12px;\">\
         This email was sent from your portfolio website.</p>\
         </div>"
    )
}

fn text_body(submission: &ContactSubmission) -> String {
    format!(
        "NEW CONTACT FORM SUBMISSION\n\
         ===========================\n\n\
         Name: {}\n\
         Email: {}\n\
         Message:\n{}\n\n\
         ---\n\
         Sent from your portfolio website.\n\
         Timestamp: {}",
        submission.name(),
        submission.email(),
        submission.message(),
        Utc::now().to_rfc3339(),
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
