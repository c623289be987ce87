//! The `Mailer` trait — the email dispatcher contract.
//!
//! The resolver treats delivery as fire-and-forget per recipient: a failed
//! send is caught and logged, never propagated. The transport behind the
//! trait (SMTP, HTTP relay, a recording fake in tests) is not this crate's
//! concern.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
  pub to:      String,
  pub subject: String,
  pub html:    String,
  pub text:    String,
}

/// Abstraction over an email transport.
pub trait Mailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Deliver one message. Returns the transport's message id.
  fn send(
    &self,
    email: OutboundEmail,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}
