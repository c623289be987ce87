//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Id sets and preference
//! blocks are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use classroom_core::{
  announcement::Announcement,
  group::Group,
  notification::{Notification, NotificationStatus, Recipients},
  user::{Mode, NotificationPreferences, User, UserRole},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── UserRole ────────────────────────────────────────────────────────────────

pub fn encode_role(r: UserRole) -> &'static str {
  match r {
    UserRole::SuperAdmin => "super_admin",
    UserRole::Admin => "admin",
    UserRole::GroupAdmin => "group_admin",
    UserRole::Student => "student",
  }
}

pub fn decode_role(s: &str) -> Result<UserRole> {
  match s {
    "super_admin" => Ok(UserRole::SuperAdmin),
    "admin" => Ok(UserRole::Admin),
    "group_admin" => Ok(UserRole::GroupAdmin),
    "student" => Ok(UserRole::Student),
    other => Err(Error::Decode(format!("unknown user role: {other:?}"))),
  }
}

// ─── Mode ────────────────────────────────────────────────────────────────────

pub fn encode_mode(m: Mode) -> &'static str {
  match m {
    Mode::Online => "online",
    Mode::Offline => "offline",
  }
}

pub fn decode_mode(s: &str) -> Result<Mode> {
  match s {
    "online" => Ok(Mode::Online),
    "offline" => Ok(Mode::Offline),
    other => Err(Error::Decode(format!("unknown mode: {other:?}"))),
  }
}

// ─── NotificationStatus ──────────────────────────────────────────────────────

pub fn encode_status(s: NotificationStatus) -> &'static str {
  match s {
    NotificationStatus::Sent => "sent",
    NotificationStatus::Delivered => "delivered",
    NotificationStatus::Read => "read",
  }
}

pub fn decode_status(s: &str) -> Result<NotificationStatus> {
  match s {
    "sent" => Ok(NotificationStatus::Sent),
    "delivered" => Ok(NotificationStatus::Delivered),
    "read" => Ok(NotificationStatus::Read),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

// ─── Id sets ─────────────────────────────────────────────────────────────────

pub fn encode_ids(ids: &[Uuid]) -> Result<String> {
  let strings: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
  Ok(serde_json::to_string(&strings)?)
}

pub fn decode_ids(s: &str) -> Result<Vec<Uuid>> {
  let strings: Vec<String> = serde_json::from_str(s)?;
  strings.iter().map(|s| decode_uuid(s)).collect()
}

// ─── Preferences ─────────────────────────────────────────────────────────────

pub fn encode_preferences(p: &NotificationPreferences) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_preferences(s: &str) -> Result<NotificationPreferences> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:         String,
  pub email:           String,
  pub name:            String,
  pub role:            String,
  pub mode:            Option<String>,
  pub is_approved:     bool,
  pub assigned_groups: String,
  pub preferences:     String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:         decode_uuid(&self.user_id)?,
      email:           self.email,
      name:            self.name,
      role:            decode_role(&self.role)?,
      mode:            self.mode.as_deref().map(decode_mode).transpose()?,
      is_approved:     self.is_approved,
      assigned_groups: decode_ids(&self.assigned_groups)?,
      preferences:     decode_preferences(&self.preferences)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `groups` row.
pub struct RawGroup {
  pub group_id:    String,
  pub name:        String,
  pub description: String,
  pub created_by:  String,
  pub created_at:  String,
}

impl RawGroup {
  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id:    decode_uuid(&self.group_id)?,
      name:        self.name,
      description: self.description,
      created_by:  decode_uuid(&self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub title:           String,
  pub content:         String,
  pub created_by:      String,
  pub created_at:      String,
  pub recipient_type:  String,
  pub recipients_json: String,
  pub status:          String,
  pub read_by:         String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    let payload: serde_json::Value = serde_json::from_str(&self.recipients_json)?;
    let recipients = Recipients::from_parts(&self.recipient_type, payload)?;

    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      title:           self.title,
      content:         self.content,
      created_by:      decode_uuid(&self.created_by)?,
      created_at:      decode_dt(&self.created_at)?,
      recipients,
      status:          decode_status(&self.status)?,
      read_by:         decode_ids(&self.read_by)?,
    })
  }
}

/// Raw strings read directly from an `announcements` row.
pub struct RawAnnouncement {
  pub announcement_id: String,
  pub title:           String,
  pub content:         String,
  pub group_ids:       String,
  pub created_by:      String,
  pub created_at:      String,
  pub updated_at:      String,
  pub priority:        bool,
  pub view_count:      i64,
  pub viewed_by:       String,
}

impl RawAnnouncement {
  pub fn into_announcement(self) -> Result<Announcement> {
    Ok(Announcement {
      announcement_id: decode_uuid(&self.announcement_id)?,
      title:           self.title,
      content:         self.content,
      group_ids:       decode_ids(&self.group_ids)?,
      created_by:      decode_uuid(&self.created_by)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      priority:        self.priority,
      view_count:      self.view_count as u32,
      viewed_by:       decode_ids(&self.viewed_by)?,
    })
  }
}
