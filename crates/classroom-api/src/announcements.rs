//! Handlers for `/announcements` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/announcements` | Optional `?user_id` scopes to the user's groups |
//! | `GET`  | `/announcements/:id` | Single announcement |
//! | `POST` | `/announcements` | Body: [`NewAnnouncementBody`]; returns 201 + delivery report |
//! | `POST` | `/announcements/:id/viewed` | Body: `{"user_id":"..."}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use classroom_core::{
  announcement::{Announcement, NewAnnouncement},
  mail::Mailer,
  store::ClassroomStore,
};
use classroom_notify::Notifier;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_id: Option<Uuid>,
}

/// `GET /announcements[?user_id=<id>]` — priority entries first, then
/// newest first.
pub async fn list<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Announcement>>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let announcements = match params.user_id {
    Some(user_id) => notifier.announcements_for_user(user_id).await?,
    None => notifier.all_announcements().await?,
  };
  Ok(Json(announcements))
}

/// `GET /announcements/:id`
pub async fn get_one<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let announcement = notifier
    .store()
    .get_announcement(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("announcement {id} not found")))?;
  Ok(Json(announcement))
}

/// JSON body accepted by `POST /announcements`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncementBody {
  pub title:      String,
  pub content:    String,
  pub group_ids:  Vec<Uuid>,
  pub created_by: Uuid,
  #[serde(default)]
  pub priority:   bool,
}

/// `POST /announcements` — returns 201 + delivery report.
pub async fn create<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Json(body): Json<NewAnnouncementBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let mut input = NewAnnouncement::new(
    body.title,
    body.content,
    body.group_ids,
    body.created_by,
  );
  input.priority = body.priority;

  let report = notifier.post_announcement(input).await?;
  Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkViewedBody {
  pub user_id: Uuid,
}

/// `POST /announcements/:id/viewed` — idempotent; 204 on success.
pub async fn mark_viewed<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MarkViewedBody>,
) -> Result<StatusCode, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  notifier
    .store()
    .get_announcement(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("announcement {id} not found")))?;

  notifier.mark_announcement_viewed(id, body.user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
