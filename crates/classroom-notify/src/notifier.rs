//! [`Notifier`] — send-path resolution and fan-out, read-path filtering.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::task::JoinSet;
use uuid::Uuid;

use classroom_core::{
  mail::{Mailer, OutboundEmail},
  notification::{NewNotification, Notification, Recipients},
  store::ClassroomStore,
  user::User,
};

use crate::{email, error::Error, resolve};

/// Upper bound on a single email send. One unreachable recipient must not
/// stall the rest of the batch.
const EMAIL_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Reports ─────────────────────────────────────────────────────────────────

/// One recipient the fan-out could not reach.
#[derive(Debug, Clone, Serialize)]
pub struct EmailFailure {
  pub to:     String,
  pub reason: String,
}

/// Per-address outcome of one fan-out. Failures here never fail the
/// operation that produced them — the durable write has already happened.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
  pub delivered: Vec<String>,
  pub failed:    Vec<EmailFailure>,
}

/// Result of [`Notifier::send_notification`].
#[derive(Debug, Serialize)]
pub struct SendReport {
  pub notification_id: Uuid,
  pub emails:          DeliveryReport,
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// The notification resolver.
///
/// Stateless between calls; all durable state lives in the store. Cloning
/// shares the underlying store and mailer handles.
pub struct Notifier<S, M> {
  store:  Arc<S>,
  mailer: Arc<M>,
}

impl<S, M> Clone for Notifier<S, M> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), mailer: Arc::clone(&self.mailer) }
  }
}

impl<S, M> Notifier<S, M>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  pub fn new(store: Arc<S>, mailer: Arc<M>) -> Self {
    Self { store, mailer }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  // ── Send path ─────────────────────────────────────────────────────────────

  /// Create a notification and fan the email side-effect out to the
  /// resolved recipients.
  ///
  /// The store write happens first and is the only fallible step once the
  /// descriptor has validated: email failures are caught per recipient
  /// and reported, never raised. Retries are not deduplicated — a caller
  /// that retries a send it believes failed may create a duplicate.
  pub async fn send_notification(
    &self,
    input: NewNotification,
  ) -> Result<SendReport, Error<S::Error>> {
    input.recipients.validate()?;

    let notification = self
      .store
      .insert_notification(input)
      .await
      .map_err(Error::Store)?;

    // A directory failure past this point aborts loudly rather than
    // silently emailing nobody; the notification itself is already
    // durable and visible to readers.
    let targets = self
      .resolve_email_targets(&notification.recipients)
      .await
      .map_err(Error::Store)?;

    let rendered =
      email::notification_email(&notification.title, &notification.content);
    let batch: Vec<OutboundEmail> = targets
      .into_iter()
      .map(|to| OutboundEmail {
        to,
        subject: rendered.subject.clone(),
        html:    rendered.html.clone(),
        text:    rendered.text.clone(),
      })
      .collect();

    let emails = self.fan_out(batch).await;

    Ok(SendReport { notification_id: notification.notification_id, emails })
  }

  /// "Send to all students" — sugar over [`Recipients::Individual`]: the
  /// approved-student list is expanded here, at send time, and stored as
  /// an explicit id list. Errors with a validation failure when the
  /// directory holds no approved students.
  pub async fn send_to_all_students(
    &self,
    title: impl Into<String>,
    content: impl Into<String>,
    created_by: Uuid,
  ) -> Result<SendReport, Error<S::Error>> {
    let students = self.store.list_students().await.map_err(Error::Store)?;
    let user_ids = students.into_iter().map(|u| u.user_id).collect();

    self
      .send_notification(NewNotification::new(
        title,
        content,
        created_by,
        Recipients::Individual { user_ids },
      ))
      .await
  }

  /// Resolve a descriptor into the email addresses that should receive
  /// the side-effect. Directory-backed variants honour the per-user
  /// `email_notifications` preference; `Bulk` bypasses the directory and
  /// targets the raw addresses as given.
  async fn resolve_email_targets(
    &self,
    recipients: &Recipients,
  ) -> Result<Vec<String>, S::Error> {
    let users: Vec<User> = match recipients {
      Recipients::Individual { user_ids } => {
        self.store.list_users_by_ids(user_ids).await?
      }
      Recipients::Group { group_ids } => {
        let mut seen = std::collections::HashSet::new();
        let mut users = Vec::new();
        for group_id in group_ids {
          for user in self.store.list_students_in_group(*group_id).await? {
            if seen.insert(user.user_id) {
              users.push(user);
            }
          }
        }
        users
      }
      Recipients::Mode { mode } => self.store.list_users_by_mode(*mode).await?,
      Recipients::Bulk { emails } => return Ok(emails.clone()),
    };

    Ok(
      users
        .into_iter()
        .filter(|u| u.preferences.email_notifications)
        .map(|u| u.email)
        .collect(),
    )
  }

  /// Dispatch a batch of emails concurrently, one supervised task per
  /// recipient, each under [`EMAIL_TIMEOUT`]. Failures are logged and
  /// collected; they never propagate.
  pub(crate) async fn fan_out(&self, batch: Vec<OutboundEmail>) -> DeliveryReport {
    let mut tasks = JoinSet::new();

    for outbound in batch {
      let mailer = Arc::clone(&self.mailer);
      tasks.spawn(async move {
        let to = outbound.to.clone();
        let outcome =
          match tokio::time::timeout(EMAIL_TIMEOUT, mailer.send(outbound)).await {
            Ok(Ok(_message_id)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {EMAIL_TIMEOUT:?}")),
          };
        (to, outcome)
      });
    }

    let mut report = DeliveryReport::default();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((to, Ok(()))) => report.delivered.push(to),
        Ok((to, Err(reason))) => {
          tracing::warn!(%to, %reason, "email delivery failed");
          report.failed.push(EmailFailure { to, reason });
        }
        // A panicking mail task loses its address but must not take the
        // batch down with it.
        Err(e) => tracing::warn!("email task panicked: {e}"),
      }
    }
    report
  }

  // ── Read path ─────────────────────────────────────────────────────────────

  /// All notifications targeting `user_id`, newest first.
  ///
  /// Matching is evaluated against the user's current groups, mode and
  /// email (see [`resolve`]): no recipient snapshot is taken at send
  /// time, so group and mode changes alter which historical notifications
  /// a user sees. An unknown user yields an empty list, not an error.
  pub async fn notifications_for_user(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<Notification>, Error<S::Error>> {
    let Some(user) = self.store.get_user(user_id).await.map_err(Error::Store)?
    else {
      return Ok(Vec::new());
    };

    let all = self.store.list_notifications().await.map_err(Error::Store)?;
    Ok(
      all
        .into_iter()
        .filter(|n| resolve::matches(&user, &n.recipients))
        .collect(),
    )
  }

  /// Unfiltered history, newest first — for admin views.
  pub async fn all_notifications(
    &self,
  ) -> Result<Vec<Notification>, Error<S::Error>> {
    self.store.list_notifications().await.map_err(Error::Store)
  }

  /// Idempotently record that `user_id` has read the notification.
  pub async fn mark_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
  ) -> Result<(), Error<S::Error>> {
    self
      .store
      .mark_notification_read(notification_id, user_id)
      .await
      .map_err(Error::Store)
  }
}
