//! Console mail transport for development. Logs emails to tracing output.

use async_trait::async_trait;
use postbox_application::{DispatchReceipt, MailTransport, OutboundEmail};
use postbox_core::AppResult;
use tracing::info;
use uuid::Uuid;

/// Development transport that logs emails instead of sending them.
#[derive(Clone)]
pub struct ConsoleMailTransport;

impl ConsoleMailTransport {
    /// Creates a new console mail transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for ConsoleMailTransport {
    async fn deliver(&self, email: &OutboundEmail) -> AppResult<DispatchReceipt> {
        let message_id = Uuid::new_v4().to_string();

        info!(
            to = email.to,
            reply_to = email.reply_to,
            subject = email.subject,
            message_id = message_id,
            "--- EMAIL (console) ---\nTo: {}\nReply-To: {}\nSubject: {}\n\n{}\n--- END EMAIL ---",
            email.to,
            email.reply_to,
            email.subject,
            email.text_body
        );

        Ok(DispatchReceipt { message_id })
    }
}
