//! Domain types for the Postbox contact relay.

#![forbid(unsafe_code)]

mod contact;

pub use contact::{ContactSubmission, RawContactRequest, ValidationErrors};
