//! The notification resolver.
//!
//! [`Notifier`] turns a recipient descriptor into concrete email
//! side-effects on the send path, and into a per-user match predicate on
//! the read path. It owns no state of its own; everything durable lives
//! behind the [`ClassroomStore`](classroom_core::store::ClassroomStore)
//! and [`Mailer`](classroom_core::mail::Mailer) it is built over.

mod announce;
mod email;
mod notifier;

pub mod error;
pub mod resolve;

pub use announce::AnnouncementReport;
pub use error::Error;
pub use notifier::{DeliveryReport, EmailFailure, Notifier, SendReport};

#[cfg(test)]
mod tests;
