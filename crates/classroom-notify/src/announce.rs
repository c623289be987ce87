//! Announcement operations.
//!
//! Announcements ride the same machinery as notifications: durable write
//! first, then a failure-isolated email fan-out to the approved students
//! of the target groups, honouring the `announcement_emails` preference.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use classroom_core::{
  announcement::{Announcement, NewAnnouncement},
  mail::{Mailer, OutboundEmail},
  store::ClassroomStore,
};

use crate::{
  email,
  error::Error,
  notifier::{DeliveryReport, Notifier},
};

/// Result of [`Notifier::post_announcement`].
#[derive(Debug, Serialize)]
pub struct AnnouncementReport {
  pub announcement_id: Uuid,
  pub emails:          DeliveryReport,
}

impl<S, M> Notifier<S, M>
where
  S: ClassroomStore + 'static,
  M: Mailer + 'static,
{
  /// Persist an announcement and email the students of its target groups.
  ///
  /// The store write happens first; email failures are collected in the
  /// report, never raised. Students in several target groups are emailed
  /// once.
  pub async fn post_announcement(
    &self,
    input: NewAnnouncement,
  ) -> Result<AnnouncementReport, Error<S::Error>> {
    let announcement = self
      .store()
      .insert_announcement(input)
      .await
      .map_err(Error::Store)?;

    let group_names = self.group_names(&announcement.group_ids).await?;

    let mut seen = HashSet::new();
    let mut batch = Vec::new();
    for group_id in &announcement.group_ids {
      let students = self
        .store()
        .list_students_in_group(*group_id)
        .await
        .map_err(Error::Store)?;
      for student in students {
        if !student.preferences.announcement_emails {
          continue;
        }
        if !seen.insert(student.user_id) {
          continue;
        }
        let rendered = email::announcement_email(
          &student.name,
          &group_names,
          &announcement.title,
          &announcement.content,
        );
        batch.push(OutboundEmail {
          to:      student.email,
          subject: rendered.subject,
          html:    rendered.html,
          text:    rendered.text,
        });
      }
    }

    let emails = self.fan_out(batch).await;

    Ok(AnnouncementReport {
      announcement_id: announcement.announcement_id,
      emails,
    })
  }

  /// Announcements visible to `user_id`: those whose target groups
  /// overlap the user's current `assigned_groups`. Priority entries
  /// first, then newest first. An unknown user yields an empty list.
  pub async fn announcements_for_user(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<Announcement>, Error<S::Error>> {
    let Some(user) =
      self.store().get_user(user_id).await.map_err(Error::Store)?
    else {
      return Ok(Vec::new());
    };

    let all = self.store().list_announcements().await.map_err(Error::Store)?;
    Ok(
      all
        .into_iter()
        .filter(|a| {
          a.group_ids.iter().any(|g| user.assigned_groups.contains(g))
        })
        .collect(),
    )
  }

  /// Unfiltered announcement history — for admin views.
  pub async fn all_announcements(
    &self,
  ) -> Result<Vec<Announcement>, Error<S::Error>> {
    self.store().list_announcements().await.map_err(Error::Store)
  }

  /// Idempotently record a view; the first view per user bumps the
  /// announcement's view counter.
  pub async fn mark_announcement_viewed(
    &self,
    announcement_id: Uuid,
    user_id: Uuid,
  ) -> Result<(), Error<S::Error>> {
    self
      .store()
      .mark_announcement_viewed(announcement_id, user_id)
      .await
      .map_err(Error::Store)
  }

  /// Display label for a set of groups, e.g. `"Linux Basics, DevOps"`.
  /// Unknown group ids are skipped.
  async fn group_names(
    &self,
    group_ids: &[Uuid],
  ) -> Result<String, Error<S::Error>> {
    let mut names = Vec::new();
    for group_id in group_ids {
      if let Some(group) =
        self.store().get_group(*group_id).await.map_err(Error::Store)?
      {
        names.push(group.name);
      }
    }
    if names.is_empty() {
      names.push("your cohort".to_owned());
    }
    Ok(names.join(", "))
  }
}
