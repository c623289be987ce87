//! HTTP mailer — posts rendered emails to an external relay service.
//!
//! The relay speaks a small JSON protocol: `POST <endpoint>` with
//! `{ "to", "subject", "html", "text" }`, answering 2xx with an optional
//! `{ "messageId" }` body. Anything else is a delivery failure, which the
//! resolver's fan-out catches per recipient.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use classroom_core::mail::{Mailer, OutboundEmail};

/// Connection settings for the mail relay.
#[derive(Debug, Clone)]
pub struct MailerConfig {
  pub endpoint: String,
  /// Sent as a bearer token when present.
  pub api_key:  Option<String>,
}

/// Failure to hand one message to the relay.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
  #[error("mail relay request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("mail relay answered {status}")]
  Status { status: reqwest::StatusCode },
}

#[derive(Serialize)]
struct SendRequest<'a> {
  to:      &'a str,
  subject: &'a str,
  html:    &'a str,
  text:    &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
  message_id: Option<String>,
}

/// [`Mailer`] backed by the HTTP relay.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpMailer {
  client: Client,
  config: MailerConfig,
}

impl HttpMailer {
  pub fn new(config: MailerConfig) -> Result<Self, DeliveryError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.config.api_key {
      Some(key) => req.bearer_auth(key),
      None => req,
    }
  }
}

impl Mailer for HttpMailer {
  type Error = DeliveryError;

  async fn send(&self, email: OutboundEmail) -> Result<String, DeliveryError> {
    let resp = self
      .request(self.client.post(&self.config.endpoint))
      .json(&SendRequest {
        to:      &email.to,
        subject: &email.subject,
        html:    &email.html,
        text:    &email.text,
      })
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(DeliveryError::Status { status });
    }

    // The relay's message id is informational; a 2xx with no body is
    // still a successful hand-off.
    let message_id = resp
      .json::<SendResponse>()
      .await
      .ok()
      .and_then(|r| r.message_id)
      .unwrap_or_else(|| "accepted".to_owned());

    tracing::debug!(to = %email.to, %message_id, "email handed to relay");
    Ok(message_id)
  }
}
