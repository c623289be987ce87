//! User records — the read-mostly half of the directory.
//!
//! The resolver only ever reads users; the provisioning operations on
//! [`ClassroomStore`](crate::store::ClassroomStore) exist so the directory
//! is real enough to drive and test.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a directory user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
  SuperAdmin,
  Admin,
  GroupAdmin,
  Student,
}

/// Whether a student attends the cohort online or offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  Online,
  Offline,
}

/// Per-user opt-outs for email side effects.
///
/// Both flags default to `true`: a user with no stored preference block is
/// treated as fully opted in, matching the default written at account
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
  pub email_notifications: bool,
  pub announcement_emails: bool,
}

impl Default for NotificationPreferences {
  fn default() -> Self {
    Self { email_notifications: true, announcement_emails: true }
  }
}

/// A directory user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:         Uuid,
  pub email:           String,
  pub name:            String,
  pub role:            UserRole,
  /// Absent for users who never picked a cohort mode; such users never
  /// match a mode-targeted notification.
  pub mode:            Option<Mode>,
  pub is_approved:     bool,
  /// Groups this user belongs to. Group membership is defined as the
  /// reverse lookup over this field.
  pub assigned_groups: Vec<Uuid>,
  pub preferences:     NotificationPreferences,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl User {
  /// An approved student is eligible for group-targeted delivery.
  pub fn is_active_student(&self) -> bool {
    self.role == UserRole::Student && self.is_approved
  }
}

/// Input to [`ClassroomStore::add_user`](crate::store::ClassroomStore::add_user).
/// The id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:           String,
  pub name:            String,
  pub role:            UserRole,
  pub mode:            Option<Mode>,
  pub is_approved:     bool,
  pub assigned_groups: Vec<Uuid>,
  pub preferences:     NotificationPreferences,
}

impl NewUser {
  /// Convenience constructor for an approved student with default
  /// preferences and no group assignments.
  pub fn student(email: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      email:           email.into(),
      name:            name.into(),
      role:            UserRole::Student,
      mode:            None,
      is_approved:     true,
      assigned_groups: Vec::new(),
      preferences:     NotificationPreferences::default(),
    }
  }
}
