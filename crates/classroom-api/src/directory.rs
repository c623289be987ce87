//! Handlers for `/users` and `/groups` — directory provisioning.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/users` | Body: [`NewUserBody`]; returns 201 + user |
//! | `GET`    | `/users/:id` | Single user |
//! | `POST`   | `/users/:id/groups` | Body: `{"group_id":"..."}`; idempotent |
//! | `DELETE` | `/users/:id/groups/:group_id` | Idempotent |
//! | `PUT`    | `/users/:id/preferences` | Body: [`NotificationPreferences`] |
//! | `POST`   | `/groups` | Body: [`NewGroupBody`]; returns 201 + group |
//! | `GET`    | `/groups` | All groups |
//! | `GET`    | `/groups/:id` | Single group |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use classroom_core::{
  group::{Group, NewGroup},
  mail::Mailer,
  store::ClassroomStore,
  user::{Mode, NewUser, NotificationPreferences, User, UserRole},
};
use classroom_notify::Notifier;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

fn store_err<E>(e: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Store(Box::new(e))
}

async fn require_user<S, M>(
  notifier: &Notifier<S, M>,
  id: Uuid,
) -> Result<User, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  notifier
    .store()
    .get_user(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /users`. Everything past email and name is
/// optional and defaults to an approved student with no groups.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserBody {
  pub email:           String,
  pub name:            String,
  pub role:            Option<UserRole>,
  pub mode:            Option<Mode>,
  pub is_approved:     Option<bool>,
  #[serde(default)]
  pub assigned_groups: Vec<Uuid>,
  pub preferences:     Option<NotificationPreferences>,
}

impl From<NewUserBody> for NewUser {
  fn from(b: NewUserBody) -> Self {
    let mut new = NewUser::student(b.email, b.name);
    if let Some(role) = b.role {
      new.role = role;
    }
    new.mode = b.mode;
    if let Some(approved) = b.is_approved {
      new.is_approved = approved;
    }
    new.assigned_groups = b.assigned_groups;
    if let Some(preferences) = b.preferences {
      new.preferences = preferences;
    }
    new
  }
}

/// `POST /users` — returns 201 + the stored [`User`].
pub async fn create_user<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Json(body): Json<NewUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  if body.email.trim().is_empty() {
    return Err(ApiError::BadRequest("email must not be empty".to_owned()));
  }
  let user = notifier
    .store()
    .add_user(NewUser::from(body))
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/:id`
pub async fn get_user<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  Ok(Json(require_user(&notifier, id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignGroupBody {
  pub group_id: Uuid,
}

/// `POST /users/:id/groups` — idempotent; 204 on success.
pub async fn assign_group<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignGroupBody>,
) -> Result<StatusCode, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  require_user(&notifier, id).await?;
  notifier
    .store()
    .assign_to_group(id, body.group_id)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/:id/groups/:group_id` — idempotent; 204 on success.
pub async fn remove_group<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path((id, group_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  require_user(&notifier, id).await?;
  notifier
    .store()
    .remove_from_group(id, group_id)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /users/:id/preferences` — replaces the whole preference block.
pub async fn set_preferences<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
  Json(preferences): Json<NotificationPreferences>,
) -> Result<StatusCode, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  require_user(&notifier, id).await?;
  notifier
    .store()
    .set_preferences(id, preferences)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Groups ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroupBody {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  pub created_by:  Uuid,
}

/// `POST /groups` — returns 201 + the stored [`Group`].
pub async fn create_group<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Json(body): Json<NewGroupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".to_owned()));
  }
  let group = notifier
    .store()
    .add_group(NewGroup {
      name:        body.name,
      description: body.description,
      created_by:  body.created_by,
    })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /groups`
pub async fn list_groups<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
) -> Result<Json<Vec<Group>>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let groups = notifier.store().list_groups().await.map_err(store_err)?;
  Ok(Json(groups))
}

/// `GET /groups/:id`
pub async fn get_group<S, M>(
  State(notifier): State<Arc<Notifier<S, M>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  let group = notifier
    .store()
    .get_group(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(group))
}
