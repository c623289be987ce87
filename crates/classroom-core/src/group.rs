//! Group records.
//!
//! A group owns no member list of its own; membership lives on each user's
//! `assigned_groups` and is resolved by reverse lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cohort group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
  pub group_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub created_by:  Uuid,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`ClassroomStore::add_group`](crate::store::ClassroomStore::add_group).
#[derive(Debug, Clone)]
pub struct NewGroup {
  pub name:        String,
  pub description: String,
  pub created_by:  Uuid,
}
