//! Announcement records.
//!
//! Announcements are group-scoped postings with view tracking. They share
//! the write-once, read-many shape of notifications but target groups only
//! and count views instead of reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
  pub announcement_id: Uuid,
  pub title:           String,
  pub content:         String,
  /// Target groups; a user sees the announcement if any of these overlap
  /// their `assigned_groups`.
  pub group_ids:       Vec<Uuid>,
  pub created_by:      Uuid,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Priority announcements sort ahead of everything else.
  pub priority:        bool,
  /// Number of distinct users who viewed the announcement. Kept equal to
  /// `viewed_by.len()` by the store.
  pub view_count:      u32,
  /// Grow-only set of viewers; duplicates suppressed.
  pub viewed_by:       Vec<Uuid>,
}

/// Input to [`ClassroomStore::insert_announcement`](crate::store::ClassroomStore::insert_announcement).
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
  pub title:      String,
  pub content:    String,
  pub group_ids:  Vec<Uuid>,
  pub created_by: Uuid,
  pub priority:   bool,
}

impl NewAnnouncement {
  pub fn new(
    title: impl Into<String>,
    content: impl Into<String>,
    group_ids: Vec<Uuid>,
    created_by: Uuid,
  ) -> Self {
    Self {
      title: title.into(),
      content: content.into(),
      group_ids,
      created_by,
      priority: false,
    }
  }
}
