//! Infrastructure adapters for the Postbox contact relay.

#![forbid(unsafe_code)]

mod console_mail_transport;
mod in_memory_rate_limit_store;
mod smtp_mail_transport;

pub use console_mail_transport::ConsoleMailTransport;
pub use in_memory_rate_limit_store::InMemoryRateLimitStore;
pub use smtp_mail_transport::{SmtpMailConfig, SmtpMailTransport};
