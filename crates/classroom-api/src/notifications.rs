//! Handlers for `/notifications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | Optional `?user_id` filters to that user's view |
//! | `GET`  | `/notifications/:id` | Single notification |
//! | `POST` | `/notifications` | Body: [`NewNotificationBody`]; returns 201 + delivery report |
//! | `POST` | `/notifications/broadcast` | Body: [`BroadcastBody`]; targets every approved student |
//! | `POST` | `/notifications/:id/read` | Body: `{"user_id":"..."}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use classroom_core::{
  mail::Mailer,
  notification::{NewNotification, Notification, Recipients},
  store::ClassroomStore,
};
use classroom_notify::{Notifier, SendReport};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, return only the notifications targeting this user. Unknown
  /// ids yield an empty list, not a 404.
  pub user_id: Option<Uuid>,
}

/// `GET /notifications[?user_id=<id>]`
pub async fn list<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let notifications = match params.user_id {
    Some(user_id) => notifier.notifications_for_user(user_id).await?,
    None => notifier.all_notifications().await?,
  };
  Ok(Json(notifications))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /notifications/:id`
pub async fn get_one<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let notification = notifier
    .store()
    .get_notification(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("notification {id} not found")))?;
  Ok(Json(notification))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /notifications`. The recipient descriptor
/// uses its tagged form, e.g. `{"type":"group","groupIds":[...]}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotificationBody {
  pub title:      String,
  pub content:    String,
  pub created_by: Uuid,
  pub recipients: Recipients,
}

/// `POST /notifications` — returns 201 + [`SendReport`].
pub async fn create<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Json(body): Json<NewNotificationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let report = notifier
    .send_notification(NewNotification::new(
      body.title,
      body.content,
      body.created_by,
      body.recipients,
    ))
    .await?;
  Ok((StatusCode::CREATED, Json(report)))
}

// ─── Broadcast ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastBody {
  pub title:      String,
  pub content:    String,
  pub created_by: Uuid,
}

/// `POST /notifications/broadcast` — send to every approved student.
pub async fn broadcast<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Json(body): Json<BroadcastBody>,
) -> Result<(StatusCode, Json<SendReport>), ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let report = notifier
    .send_to_all_students(body.title, body.content, body.created_by)
    .await?;
  Ok((StatusCode::CREATED, Json(report)))
}

// ─── Mark read ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadBody {
  pub user_id: Uuid,
}

/// `POST /notifications/:id/read` — idempotent; 204 on success.
pub async fn mark_read<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MarkReadBody>,
) -> Result<StatusCode, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  notifier
    .store()
    .get_notification(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("notification {id} not found")))?;

  notifier.mark_read(id, body.user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
