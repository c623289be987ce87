//! The `ClassroomStore` trait.
//!
//! One abstraction over the backing document store, sectioned by the
//! collaborator it stands in for: the User Directory and Group Directory
//! (read-mostly), the Notification Store and the Announcement Store
//! (append-plus-merge). Implemented by storage backends
//! (e.g. `classroom-store-sqlite`); higher layers depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  announcement::{Announcement, NewAnnouncement},
  group::{Group, NewGroup},
  notification::{NewNotification, Notification},
  user::{Mode, NewUser, NotificationPreferences, User},
};

/// Abstraction over the classroom document store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ClassroomStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── User directory ────────────────────────────────────────────────────

  /// Create and persist a user. Id and timestamps are store-assigned.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Fetch the users for the given ids. Ids with no backing record are
  /// silently skipped; the result order is unspecified.
  fn list_users_by_ids<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  /// All users whose `mode` equals `mode`. Users with no mode are never
  /// included.
  fn list_users_by_mode(
    &self,
    mode: Mode,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// All approved students.
  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// All approved students whose `assigned_groups` contains `group_id` —
  /// the reverse membership lookup.
  fn list_students_in_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Add `group_id` to the user's `assigned_groups` (idempotent).
  fn assign_to_group(
    &self,
    user_id: Uuid,
    group_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove `group_id` from the user's `assigned_groups` (idempotent).
  fn remove_from_group(
    &self,
    user_id: Uuid,
    group_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the user's notification preferences.
  fn set_preferences(
    &self,
    user_id: Uuid,
    preferences: NotificationPreferences,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Group directory ───────────────────────────────────────────────────

  fn add_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  // ── Notification store ────────────────────────────────────────────────

  /// Persist a new notification with `status = sent`, an empty `read_by`
  /// set and a store-assigned `created_at`.
  fn insert_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Retrieve a notification by id. Returns `None` if not found.
  fn get_notification(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send + '_;

  /// All notifications, newest first.
  fn list_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Idempotently insert `user_id` into the notification's `read_by` set
  /// and set `status = read`. Insertion must be commutative: concurrent
  /// markers for different users must not lose each other's updates.
  /// Errors if the notification does not exist.
  fn mark_notification_read(
    &self,
    id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Announcement store ────────────────────────────────────────────────

  /// Persist a new announcement with zero views.
  fn insert_announcement(
    &self,
    input: NewAnnouncement,
  ) -> impl Future<Output = Result<Announcement, Self::Error>> + Send + '_;

  fn get_announcement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Announcement>, Self::Error>> + Send + '_;

  /// All announcements, priority entries first, then newest first.
  fn list_announcements(
    &self,
  ) -> impl Future<Output = Result<Vec<Announcement>, Self::Error>> + Send + '_;

  /// Idempotently add `user_id` to `viewed_by`; the first view per user
  /// increments `view_count` exactly once. Errors if the announcement
  /// does not exist.
  fn mark_announcement_viewed(
    &self,
    id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
