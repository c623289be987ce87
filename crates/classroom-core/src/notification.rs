//! Notification records and the recipient descriptor.
//!
//! A notification is created once and never edited or deleted; only
//! `status` and `read_by` mutate after the fact, and `read_by` only grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::Mode};

// ─── Recipients ──────────────────────────────────────────────────────────────

/// The recipient descriptor — decides which users a notification targets.
///
/// Exactly one targeting strategy per notification; a sum type makes the
/// invalid field combinations of the original schema unrepresentable. The
/// variant name doubles as the `recipient_type` discriminant stored in the
/// database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Recipients {
  /// Explicitly enumerated users. "Send to all students" is sugar over
  /// this variant; callers expand the student list up front.
  #[serde(rename_all = "camelCase")]
  Individual { user_ids: Vec<Uuid> },
  /// Every approved student of any of the listed groups.
  #[serde(rename_all = "camelCase")]
  Group { group_ids: Vec<Uuid> },
  /// Every user attending in the given mode.
  Mode { mode: Mode },
  /// Raw addresses, bypassing the directory entirely. The addresses may
  /// or may not belong to registered users.
  Bulk { emails: Vec<String> },
}

impl Recipients {
  /// The discriminant string stored in the `recipient_type` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Individual { .. } => "individual",
      Self::Group { .. } => "group",
      Self::Mode { .. } => "mode",
      Self::Bulk { .. } => "bulk",
    }
  }

  /// Reject descriptors whose target list is empty. A `Mode` descriptor
  /// always carries exactly one mode and cannot be empty.
  pub fn validate(&self) -> Result<()> {
    let empty = match self {
      Self::Individual { user_ids } => user_ids.is_empty(),
      Self::Group { group_ids } => group_ids.is_empty(),
      Self::Mode { .. } => false,
      Self::Bulk { emails } => emails.is_empty(),
    };
    if empty {
      return Err(Error::EmptyRecipients(self.discriminant()));
    }
    Ok(())
  }

  /// Serialise the payload (without the type tag) for the
  /// `recipients_json` database column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let mut full = serde_json::to_value(self)?;
    if let Some(map) = full.as_object_mut() {
      map.remove("type");
    }
    Ok(full)
  }

  /// Deserialise from the discriminant string and JSON payload stored in
  /// the database.
  pub fn from_parts(
    discriminant: &str,
    mut data: serde_json::Value,
  ) -> Result<Self> {
    if let Some(map) = data.as_object_mut() {
      map.insert(
        "type".to_owned(),
        serde_json::Value::String(discriminant.to_owned()),
      );
    }
    Ok(serde_json::from_value(data)?)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Delivery status of a notification.
///
/// `Sent` at creation. Nothing currently transitions to `Delivered`.
/// `Read` is set opportunistically whenever anyone marks the notification
/// read; it is a weak signal, not authoritative per-user state — that is
/// what `read_by` is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
  Sent,
  Delivered,
  Read,
}

// ─── Notification ────────────────────────────────────────────────────────────

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub title:           String,
  pub content:         String,
  pub created_by:      Uuid,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:      DateTime<Utc>,
  pub recipients:      Recipients,
  pub status:          NotificationStatus,
  /// Users who have marked this notification read. Grow-only set;
  /// insertion order is irrelevant and duplicates are suppressed.
  pub read_by:         Vec<Uuid>,
}

/// Input to [`ClassroomStore::insert_notification`](crate::store::ClassroomStore::insert_notification).
/// Id, `created_at`, `status` and `read_by` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub title:      String,
  pub content:    String,
  pub created_by: Uuid,
  pub recipients: Recipients,
}

impl NewNotification {
  pub fn new(
    title: impl Into<String>,
    content: impl Into<String>,
    created_by: Uuid,
    recipients: Recipients,
  ) -> Self {
    Self {
      title: title.into(),
      content: content.into(),
      created_by,
      recipients,
    }
  }
}
