//! SMTP mail transport using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use postbox_application::{DispatchReceipt, MailTransport, OutboundEmail};
use postbox_core::{AppError, AppResult};
use uuid::Uuid;

/// SMTP transport configuration.
#[derive(Clone)]
pub struct SmtpMailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
}

/// Production mail transport delivering over SMTP.
#[derive(Clone)]
pub struct SmtpMailTransport {
    config: SmtpMailConfig,
}

impl SmtpMailTransport {
    /// Creates a new SMTP mail transport.
    #[must_use]
    pub fn new(config: SmtpMailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, email: &OutboundEmail) -> AppResult<DispatchReceipt> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|error| AppError::Envelope(format!("invalid from address: {error}")))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|error| AppError::Envelope(format!("invalid recipient address: {error}")))?;
        let reply_to: Mailbox = email
            .reply_to
            .parse()
            .map_err(|error| AppError::Envelope(format!("invalid reply-to address: {error}")))?;

        // SMTP gives us no provider-assigned id, so the relay mints the
        // Message-ID itself and reports it back as the receipt.
        let message_id = format!("<{}@postbox>", Uuid::new_v4());

        let message = Message::builder()
            .from(from)
            .to(to)
            .reply_to(reply_to)
            .subject(email.subject.clone())
            .message_id(Some(message_id.clone()))
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|error| AppError::Dispatch(format!("failed to build email: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Dispatch(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| classify_smtp_error(&error.to_string()))?;

        Ok(DispatchReceipt { message_id })
    }
}

/// Maps an SMTP failure onto the error taxonomy by its reply code.
///
/// 535/534/530 are authentication rejections; 501/550/553 are envelope
/// (address) rejections. Everything else is a generic dispatch failure
/// carrying the provider's message.
fn classify_smtp_error(detail: &str) -> AppError {
    let lower = detail.to_lowercase();

    if ["535", "534", "530"]
        .iter()
        .any(|code| detail.contains(code))
        || lower.contains("authentication")
        || lower.contains("credentials")
    {
        return AppError::ProviderAuth(detail.to_owned());
    }

    if ["501", "550", "553"]
        .iter()
        .any(|code| detail.contains(code))
        || lower.contains("address")
    {
        return AppError::Envelope(detail.to_owned());
    }

    AppError::Dispatch(detail.to_owned())
}
