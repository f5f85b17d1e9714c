//! Application services and ports for the Postbox contact relay.

#![forbid(unsafe_code)]

mod contact_mailer;
mod rate_limit_service;

pub use contact_mailer::{ContactMailer, DispatchReceipt, MailTransport, OutboundEmail};
pub use rate_limit_service::{
    RateLimitDecision, RateLimitRecord, RateLimitRule, RateLimitService, RateLimitStore,
};
