//! [`SqliteStore`] — the SQLite implementation of [`ClassroomStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use classroom_core::{
  announcement::{Announcement, NewAnnouncement},
  group::{Group, NewGroup},
  notification::{NewNotification, Notification, NotificationStatus},
  store::ClassroomStore,
  user::{Mode, NewUser, NotificationPreferences, User},
};

use crate::{
  Error, Result,
  encode::{
    RawAnnouncement, RawGroup, RawNotification, RawUser, encode_dt,
    encode_ids, encode_mode, encode_preferences, encode_role, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A classroom store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised onto the connection's worker thread, so a read-modify-
/// write performed inside a single `call` closure is atomic with respect
/// to every other store operation. The grow-only `read_by` / `viewed_by`
/// merges rely on this.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Wrap a non-rusqlite error for transport out of a `call` closure.
fn other(
  e: impl std::error::Error + Send + Sync + 'static,
) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

const USER_COLUMNS: &str = "user_id, email, name, role, mode, is_approved, \
                            assigned_groups, preferences, created_at, updated_at";

const NOTIFICATION_COLUMNS: &str =
  "notification_id, title, content, created_by, created_at, \
   recipient_type, recipients_json, status, read_by";

const ANNOUNCEMENT_COLUMNS: &str =
  "announcement_id, title, content, group_ids, created_by, created_at, \
   updated_at, priority, view_count, viewed_by";

fn raw_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:         row.get(0)?,
    email:           row.get(1)?,
    name:            row.get(2)?,
    role:            row.get(3)?,
    mode:            row.get(4)?,
    is_approved:     row.get(5)?,
    assigned_groups: row.get(6)?,
    preferences:     row.get(7)?,
    created_at:      row.get(8)?,
    updated_at:      row.get(9)?,
  })
}

fn raw_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawNotification> {
  Ok(RawNotification {
    notification_id: row.get(0)?,
    title:           row.get(1)?,
    content:         row.get(2)?,
    created_by:      row.get(3)?,
    created_at:      row.get(4)?,
    recipient_type:  row.get(5)?,
    recipients_json: row.get(6)?,
    status:          row.get(7)?,
    read_by:         row.get(8)?,
  })
}

fn raw_announcement(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAnnouncement> {
  Ok(RawAnnouncement {
    announcement_id: row.get(0)?,
    title:           row.get(1)?,
    content:         row.get(2)?,
    group_ids:       row.get(3)?,
    created_by:      row.get(4)?,
    created_at:      row.get(5)?,
    updated_at:      row.get(6)?,
    priority:        row.get(7)?,
    view_count:      row.get(8)?,
    viewed_by:       row.get(9)?,
  })
}

fn raw_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawGroup> {
  Ok(RawGroup {
    group_id:    row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
    created_by:  row.get(3)?,
    created_at:  row.get(4)?,
  })
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a users query with no parameters and decode the rows.
  async fn select_users(&self, sql: &'static str) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], raw_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }
}

// ─── ClassroomStore impl ─────────────────────────────────────────────────────

impl ClassroomStore for SqliteStore {
  type Error = Error;

  // ── User directory ────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      user_id:         Uuid::new_v4(),
      email:           input.email,
      name:            input.name,
      role:            input.role,
      mode:            input.mode,
      is_approved:     input.is_approved,
      assigned_groups: input.assigned_groups,
      preferences:     input.preferences,
      created_at:      now,
      updated_at:      now,
    };

    let id_str     = encode_uuid(user.user_id);
    let email      = user.email.clone();
    let name       = user.name.clone();
    let role_str   = encode_role(user.role).to_owned();
    let mode_str   = user.mode.map(encode_mode).map(str::to_owned);
    let approved   = user.is_approved;
    let groups_str = encode_ids(&user.assigned_groups)?;
    let prefs_str  = encode_preferences(&user.preferences)?;
    let at_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, email, name, role, mode, is_approved,
             assigned_groups, preferences, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            id_str, email, name, role_str, mode_str, approved,
            groups_str, prefs_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              raw_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let placeholders =
          std::iter::repeat_n("?", id_strs.len()).collect::<Vec<_>>().join(", ");
        let sql = format!(
          "SELECT {USER_COLUMNS} FROM users WHERE user_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), raw_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn list_users_by_mode(&self, mode: Mode) -> Result<Vec<User>> {
    let mode_str = encode_mode(mode).to_owned();

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE mode = ?1"))?;
        let rows = stmt
          .query_map(rusqlite::params![mode_str], raw_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn list_students(&self) -> Result<Vec<User>> {
    self
      .select_users(
        "SELECT user_id, email, name, role, mode, is_approved, \
         assigned_groups, preferences, created_at, updated_at \
         FROM users WHERE role = 'student' AND is_approved = 1",
      )
      .await
  }

  async fn list_students_in_group(&self, group_id: Uuid) -> Result<Vec<User>> {
    // Reverse membership lookup: scan approved students and filter on the
    // decoded assigned_groups set.
    let students = self.list_students().await?;
    Ok(
      students
        .into_iter()
        .filter(|u| u.assigned_groups.contains(&group_id))
        .collect(),
    )
  }

  async fn assign_to_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
    let user_str  = encode_uuid(user_id);
    let group_str = encode_uuid(group_id);
    let now_str   = encode_dt(Utc::now());

    let found: bool = self
      .conn
      .call(move |conn| {
        let row: Option<String> = conn
          .query_row(
            "SELECT assigned_groups FROM users WHERE user_id = ?1",
            rusqlite::params![user_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(groups_json) = row else { return Ok(false) };

        let mut groups: Vec<String> =
          serde_json::from_str(&groups_json).map_err(other)?;
        if !groups.contains(&group_str) {
          groups.push(group_str);
        }
        let encoded = serde_json::to_string(&groups).map_err(other)?;

        conn.execute(
          "UPDATE users SET assigned_groups = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![user_str, encoded, now_str],
        )?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  async fn remove_from_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
    let user_str  = encode_uuid(user_id);
    let group_str = encode_uuid(group_id);
    let now_str   = encode_dt(Utc::now());

    let found: bool = self
      .conn
      .call(move |conn| {
        let row: Option<String> = conn
          .query_row(
            "SELECT assigned_groups FROM users WHERE user_id = ?1",
            rusqlite::params![user_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(groups_json) = row else { return Ok(false) };

        let mut groups: Vec<String> =
          serde_json::from_str(&groups_json).map_err(other)?;
        groups.retain(|g| g != &group_str);
        let encoded = serde_json::to_string(&groups).map_err(other)?;

        conn.execute(
          "UPDATE users SET assigned_groups = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![user_str, encoded, now_str],
        )?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  async fn set_preferences(
    &self,
    user_id: Uuid,
    preferences: NotificationPreferences,
  ) -> Result<()> {
    let user_str  = encode_uuid(user_id);
    let prefs_str = encode_preferences(&preferences)?;
    let now_str   = encode_dt(Utc::now());

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET preferences = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![user_str, prefs_str, now_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  // ── Group directory ───────────────────────────────────────────────────────

  async fn add_group(&self, input: NewGroup) -> Result<Group> {
    let group = Group {
      group_id:    Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      created_by:  input.created_by,
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(group.group_id);
    let name        = group.name.clone();
    let description = group.description.clone();
    let by_str      = encode_uuid(group.created_by);
    let at_str      = encode_dt(group.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (group_id, name, description, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, description, by_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(group)
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT group_id, name, description, created_by, created_at
               FROM groups WHERE group_id = ?1",
              rusqlite::params![id_str],
              raw_group,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    let raws: Vec<RawGroup> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT group_id, name, description, created_by, created_at FROM groups",
        )?;
        let rows = stmt
          .query_map([], raw_group)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_group).collect()
  }

  // ── Notification store ────────────────────────────────────────────────────

  async fn insert_notification(
    &self,
    input: NewNotification,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      title:           input.title,
      content:         input.content,
      created_by:      input.created_by,
      created_at:      Utc::now(),
      recipients:      input.recipients,
      status:          NotificationStatus::Sent,
      read_by:         Vec::new(),
    };

    let id_str       = encode_uuid(notification.notification_id);
    let title        = notification.title.clone();
    let content      = notification.content.clone();
    let by_str       = encode_uuid(notification.created_by);
    let at_str       = encode_dt(notification.created_at);
    let rcpt_type    = notification.recipients.discriminant().to_owned();
    let rcpt_json    = notification.recipients.to_json()?.to_string();
    let status_str   = encode_status(notification.status).to_owned();
    let read_by_str  = encode_ids(&notification.read_by)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, title, content, created_by, created_at,
             recipient_type, recipients_json, status, read_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, title, content, by_str, at_str,
            rcpt_type, rcpt_json, status_str, read_by_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNotification> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE notification_id = ?1"
              ),
              rusqlite::params![id_str],
              raw_notification,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNotification::into_notification).transpose()
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>> {
    let raws: Vec<RawNotification> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications"))?;
        let rows = stmt
          .query_map([], raw_notification)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut notifications: Vec<Notification> = raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect::<Result<_>>()?;

    // RFC 3339 strings with variable fraction length do not sort
    // lexicographically; order after decoding.
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(notifications)
  }

  async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);

    let found: bool = self
      .conn
      .call(move |conn| {
        let row: Option<String> = conn
          .query_row(
            "SELECT read_by FROM notifications WHERE notification_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(read_by_json) = row else { return Ok(false) };

        let mut read_by: Vec<String> =
          serde_json::from_str(&read_by_json).map_err(other)?;
        if !read_by.contains(&user_str) {
          read_by.push(user_str);
        }
        let encoded = serde_json::to_string(&read_by).map_err(other)?;

        conn.execute(
          "UPDATE notifications SET status = 'read', read_by = ?2
           WHERE notification_id = ?1",
          rusqlite::params![id_str, encoded],
        )?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::NotificationNotFound(id));
    }
    Ok(())
  }

  // ── Announcement store ────────────────────────────────────────────────────

  async fn insert_announcement(
    &self,
    input: NewAnnouncement,
  ) -> Result<Announcement> {
    let now = Utc::now();
    let announcement = Announcement {
      announcement_id: Uuid::new_v4(),
      title:           input.title,
      content:         input.content,
      group_ids:       input.group_ids,
      created_by:      input.created_by,
      created_at:      now,
      updated_at:      now,
      priority:        input.priority,
      view_count:      0,
      viewed_by:       Vec::new(),
    };

    let id_str     = encode_uuid(announcement.announcement_id);
    let title      = announcement.title.clone();
    let content    = announcement.content.clone();
    let groups_str = encode_ids(&announcement.group_ids)?;
    let by_str     = encode_uuid(announcement.created_by);
    let at_str     = encode_dt(now);
    let priority   = announcement.priority;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO announcements (
             announcement_id, title, content, group_ids, created_by,
             created_at, updated_at, priority, view_count, viewed_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, 0, '[]')",
          rusqlite::params![
            id_str, title, content, groups_str, by_str, at_str, priority,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(announcement)
  }

  async fn get_announcement(&self, id: Uuid) -> Result<Option<Announcement>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAnnouncement> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements
                 WHERE announcement_id = ?1"
              ),
              rusqlite::params![id_str],
              raw_announcement,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAnnouncement::into_announcement).transpose()
  }

  async fn list_announcements(&self) -> Result<Vec<Announcement>> {
    let raws: Vec<RawAnnouncement> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements"))?;
        let rows = stmt
          .query_map([], raw_announcement)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut announcements: Vec<Announcement> = raws
      .into_iter()
      .map(RawAnnouncement::into_announcement)
      .collect::<Result<_>>()?;

    // Priority entries first, then newest first.
    announcements.sort_by(|a, b| {
      b.priority
        .cmp(&a.priority)
        .then(b.created_at.cmp(&a.created_at))
    });
    Ok(announcements)
  }

  async fn mark_announcement_viewed(&self, id: Uuid, user_id: Uuid) -> Result<()> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let now_str  = encode_dt(Utc::now());

    let found: bool = self
      .conn
      .call(move |conn| {
        let row: Option<String> = conn
          .query_row(
            "SELECT viewed_by FROM announcements WHERE announcement_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(viewed_by_json) = row else { return Ok(false) };

        let mut viewed_by: Vec<String> =
          serde_json::from_str(&viewed_by_json).map_err(other)?;
        // First view per user bumps the counter exactly once.
        if !viewed_by.contains(&user_str) {
          viewed_by.push(user_str);
          let encoded = serde_json::to_string(&viewed_by).map_err(other)?;
          conn.execute(
            "UPDATE announcements
             SET viewed_by = ?2, view_count = view_count + 1, updated_at = ?3
             WHERE announcement_id = ?1",
            rusqlite::params![id_str, encoded, now_str],
          )?;
        }
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::AnnouncementNotFound(id));
    }
    Ok(())
  }
}
