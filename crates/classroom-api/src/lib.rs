//! JSON REST API for the classroom notification service.
//!
//! Exposes an axum [`Router`] backed by a [`classroom_notify::Notifier`]
//! over any store and mailer. Auth, TLS, and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", classroom_api::api_router(notifier.clone()))
//! ```

pub mod announcements;
pub mod directory;
pub mod error;
pub mod notifications;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use classroom_core::{mail::Mailer, store::ClassroomStore};
use classroom_notify::Notifier;

pub use error::ApiError;

/// Build a fully-materialised API router for `notifier`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(notifier: Arc<Notifier<S, M>>) -> Router<()>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  Router::new()
    // Notifications
    .route(
      "/notifications",
      get(notifications::list::<S, M>).post(notifications::create::<S, M>),
    )
    .route(
      "/notifications/broadcast",
      post(notifications::broadcast::<S, M>),
    )
    .route("/notifications/{id}", get(notifications::get_one::<S, M>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S, M>))
    // Announcements
    .route(
      "/announcements",
      get(announcements::list::<S, M>).post(announcements::create::<S, M>),
    )
    .route("/announcements/{id}", get(announcements::get_one::<S, M>))
    .route(
      "/announcements/{id}/viewed",
      post(announcements::mark_viewed::<S, M>),
    )
    // Directory
    .route("/users", post(directory::create_user::<S, M>))
    .route("/users/{id}", get(directory::get_user::<S, M>))
    .route("/users/{id}/groups", post(directory::assign_group::<S, M>))
    .route(
      "/users/{id}/groups/{group_id}",
      axum::routing::delete(directory::remove_group::<S, M>),
    )
    .route(
      "/users/{id}/preferences",
      put(directory::set_preferences::<S, M>),
    )
    .route(
      "/groups",
      get(directory::list_groups::<S, M>).post(directory::create_group::<S, M>),
    )
    .route("/groups/{id}", get(directory::get_group::<S, M>))
    .with_state(notifier)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use classroom_core::mail::{Mailer, OutboundEmail};
  use classroom_notify::Notifier;
  use classroom_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  /// Accepts everything; the resolver's delivery behaviour is covered in
  /// its own crate.
  struct NullMailer;

  #[derive(Debug, thiserror::Error)]
  #[error("unreachable")]
  struct Never;

  impl Mailer for NullMailer {
    type Error = Never;

    async fn send(&self, _email: OutboundEmail) -> Result<String, Never> {
      Ok("ok".to_owned())
    }
  }

  async fn make_router() -> Router<()> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    api_router(Arc::new(Notifier::new(store, Arc::new(NullMailer))))
  }

  async fn request(
    router: &Router<()>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = router
      .clone()
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn create_student(router: &Router<()>, email: &str) -> Uuid {
    let (status, user) = request(
      router,
      "POST",
      "/users",
      Some(json!({ "email": email, "name": "Student" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    user["user_id"].as_str().unwrap().parse().unwrap()
  }

  #[tokio::test]
  async fn notification_create_then_read_roundtrip() {
    let router = make_router().await;
    let user_id = create_student(&router, "a@example.com").await;

    let (status, report) = request(
      &router,
      "POST",
      "/notifications",
      Some(json!({
        "title":     "Exam schedule",
        "content":   "Friday, 10:00.",
        "createdBy": Uuid::new_v4(),
        "recipients": { "type": "individual", "userIds": [user_id] },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["emails"]["delivered"].as_array().unwrap().len(), 1);
    let id = report["notification_id"].as_str().unwrap();

    let (status, listed) =
      request(&router, "GET", &format!("/notifications?user_id={user_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["notification_id"].as_str().unwrap(), id);

    let (status, _) = request(
      &router,
      "POST",
      &format!("/notifications/{id}/read"),
      Some(json!({ "userId": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, stored) =
      request(&router, "GET", &format!("/notifications/{id}"), None).await;
    assert_eq!(stored["read_by"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn empty_recipient_list_is_a_400() {
    let router = make_router().await;
    let (status, body) = request(
      &router,
      "POST",
      "/notifications",
      Some(json!({
        "title":     "x",
        "content":   "y",
        "createdBy": Uuid::new_v4(),
        "recipients": { "type": "group", "groupIds": [] },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("group"));
  }

  #[tokio::test]
  async fn unknown_notification_is_a_404() {
    let router = make_router().await;
    let id = Uuid::new_v4();

    let (status, _) =
      request(&router, "GET", &format!("/notifications/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
      &router,
      "POST",
      &format!("/notifications/{id}/read"),
      Some(json!({ "userId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn broadcast_targets_every_student() {
    let router = make_router().await;
    create_student(&router, "a@example.com").await;
    create_student(&router, "b@example.com").await;

    let (status, report) = request(
      &router,
      "POST",
      "/notifications/broadcast",
      Some(json!({
        "title":     "Welcome",
        "content":   "Term starts Monday.",
        "createdBy": Uuid::new_v4(),
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["emails"]["delivered"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn group_lifecycle_drives_announcement_visibility() {
    let router = make_router().await;
    let admin = Uuid::new_v4();

    let (status, group) = request(
      &router,
      "POST",
      "/groups",
      Some(json!({ "name": "Linux Basics", "createdBy": admin })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = group["group_id"].as_str().unwrap().to_owned();

    let user_id = create_student(&router, "a@example.com").await;
    let (status, _) = request(
      &router,
      "POST",
      &format!("/users/{user_id}/groups"),
      Some(json!({ "groupId": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, report) = request(
      &router,
      "POST",
      "/announcements",
      Some(json!({
        "title":     "Holiday",
        "content":   "No class Monday.",
        "groupIds":  [group_id],
        "createdBy": admin,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let announcement_id = report["announcement_id"].as_str().unwrap();

    let (status, listed) = request(
      &router,
      "GET",
      &format!("/announcements?user_id={user_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = request(
      &router,
      "POST",
      &format!("/announcements/{announcement_id}/viewed"),
      Some(json!({ "userId": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, stored) =
      request(&router, "GET", &format!("/announcements/{announcement_id}"), None)
        .await;
    assert_eq!(stored["view_count"].as_u64().unwrap(), 1);

    // Dropping the membership hides the announcement again.
    let (status, _) = request(
      &router,
      "DELETE",
      &format!("/users/{user_id}/groups/{group_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, listed) = request(
      &router,
      "GET",
      &format!("/announcements?user_id={user_id}"),
      None,
    )
    .await;
    assert!(listed.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn preference_update_suppresses_emails() {
    let router = make_router().await;
    let user_id = create_student(&router, "quiet@example.com").await;

    let (status, _) = request(
      &router,
      "PUT",
      &format!("/users/{user_id}/preferences"),
      Some(json!({ "emailNotifications": false, "announcementEmails": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, report) = request(
      &router,
      "POST",
      "/notifications",
      Some(json!({
        "title":     "x",
        "content":   "y",
        "createdBy": Uuid::new_v4(),
        "recipients": { "type": "individual", "userIds": [user_id] },
      })),
    )
    .await;
    assert!(report["emails"]["delivered"].as_array().unwrap().is_empty());

    // Still visible on the read path.
    let (_, listed) =
      request(&router, "GET", &format!("/notifications?user_id={user_id}"), None)
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn blank_user_email_is_a_400() {
    let router = make_router().await;
    let (status, _) = request(
      &router,
      "POST",
      "/users",
      Some(json!({ "email": "  ", "name": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
