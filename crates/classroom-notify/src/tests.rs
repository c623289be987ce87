//! Resolver tests against an in-memory store and a recording fake mailer.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
};

use classroom_core::{
  announcement::NewAnnouncement,
  group::NewGroup,
  mail::{Mailer, OutboundEmail},
  notification::{NewNotification, Recipients},
  store::ClassroomStore,
  user::{Mode, NewUser, NotificationPreferences},
};
use classroom_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{Error, Notifier};

// ─── Fake mailer ─────────────────────────────────────────────────────────────

/// Records every accepted message; addresses in `rejects` fail the send.
#[derive(Default)]
struct FakeMailer {
  sent:    Mutex<Vec<OutboundEmail>>,
  rejects: Mutex<HashSet<String>>,
}

#[derive(Debug, thiserror::Error)]
#[error("relay rejected {0}")]
struct Rejected(String);

impl FakeMailer {
  fn reject(&self, address: &str) {
    self.rejects.lock().unwrap().insert(address.to_owned());
  }

  fn recipients(&self) -> Vec<String> {
    self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect()
  }
}

impl Mailer for FakeMailer {
  type Error = Rejected;

  async fn send(&self, email: OutboundEmail) -> Result<String, Rejected> {
    if self.rejects.lock().unwrap().contains(&email.to) {
      return Err(Rejected(email.to));
    }
    let mut sent = self.sent.lock().unwrap();
    sent.push(email);
    Ok(format!("msg-{}", sent.len()))
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

async fn notifier() -> (Notifier<SqliteStore, FakeMailer>, Arc<FakeMailer>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let mailer = Arc::new(FakeMailer::default());
  (Notifier::new(store, Arc::clone(&mailer)), mailer)
}

fn student(email: &str) -> NewUser {
  NewUser::student(email, email.split('@').next().unwrap())
}

fn student_in(email: &str, groups: Vec<Uuid>) -> NewUser {
  let mut new = student(email);
  new.assigned_groups = groups;
  new
}

fn notification(recipients: Recipients) -> NewNotification {
  NewNotification::new("Exam schedule", "Friday, 10:00.", Uuid::new_v4(), recipients)
}

// ─── Send path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn individual_send_emails_each_listed_user() {
  let (n, mailer) = notifier().await;
  let a = n.store().add_user(student("a@example.com")).await.unwrap();
  let b = n.store().add_user(student("b@example.com")).await.unwrap();

  let report = n
    .send_notification(notification(Recipients::Individual {
      user_ids: vec![a.user_id, b.user_id],
    }))
    .await
    .unwrap();

  assert_eq!(report.emails.delivered.len(), 2);
  assert!(report.emails.failed.is_empty());

  let mut to = mailer.recipients();
  to.sort();
  assert_eq!(to, vec!["a@example.com", "b@example.com"]);
}

#[tokio::test]
async fn group_send_unions_and_deduplicates() {
  let (n, mailer) = notifier().await;
  let (g1, g2) = (Uuid::new_v4(), Uuid::new_v4());

  n.store().add_user(student_in("only-g1@example.com", vec![g1])).await.unwrap();
  n.store().add_user(student_in("only-g2@example.com", vec![g2])).await.unwrap();
  // In both groups: must receive exactly one email.
  n.store().add_user(student_in("both@example.com", vec![g1, g2])).await.unwrap();
  n.store().add_user(student("neither@example.com")).await.unwrap();

  let report = n
    .send_notification(notification(Recipients::Group { group_ids: vec![g1, g2] }))
    .await
    .unwrap();

  assert_eq!(report.emails.delivered.len(), 3);
  let mut to = mailer.recipients();
  to.sort();
  assert_eq!(to, vec![
    "both@example.com",
    "only-g1@example.com",
    "only-g2@example.com"
  ]);
}

#[tokio::test]
async fn mode_send_targets_matching_mode_only() {
  let (n, mailer) = notifier().await;

  let mut online = student("online@example.com");
  online.mode = Some(Mode::Online);
  n.store().add_user(online).await.unwrap();

  let mut offline = student("offline@example.com");
  offline.mode = Some(Mode::Offline);
  n.store().add_user(offline).await.unwrap();

  n.store().add_user(student("modeless@example.com")).await.unwrap();

  n.send_notification(notification(Recipients::Mode { mode: Mode::Online }))
    .await
    .unwrap();

  assert_eq!(mailer.recipients(), vec!["online@example.com"]);
}

#[tokio::test]
async fn opted_out_user_is_skipped_but_still_sees_notification() {
  let (n, mailer) = notifier().await;
  let user = n.store().add_user(student("quiet@example.com")).await.unwrap();
  n.store()
    .set_preferences(user.user_id, NotificationPreferences {
      email_notifications: false,
      announcement_emails: true,
    })
    .await
    .unwrap();

  let report = n
    .send_notification(notification(Recipients::Individual {
      user_ids: vec![user.user_id],
    }))
    .await
    .unwrap();

  // No email side-effect...
  assert!(mailer.recipients().is_empty());
  assert!(report.emails.delivered.is_empty());

  // ...but the notification is durable and visible on the read path.
  let visible = n.notifications_for_user(user.user_id).await.unwrap();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].notification_id, report.notification_id);
}

#[tokio::test]
async fn one_unreachable_recipient_does_not_fail_the_send() {
  let (n, mailer) = notifier().await;
  let a = n.store().add_user(student("a@example.com")).await.unwrap();
  let b = n.store().add_user(student("bad@example.com")).await.unwrap();
  let c = n.store().add_user(student("c@example.com")).await.unwrap();
  mailer.reject("bad@example.com");

  let report = n
    .send_notification(notification(Recipients::Individual {
      user_ids: vec![a.user_id, b.user_id, c.user_id],
    }))
    .await
    .unwrap();

  assert_eq!(report.emails.delivered.len(), 2);
  assert_eq!(report.emails.failed.len(), 1);
  assert_eq!(report.emails.failed[0].to, "bad@example.com");

  // The notification exists despite the partial delivery failure.
  let stored = n
    .store()
    .get_notification(report.notification_id)
    .await
    .unwrap();
  assert!(stored.is_some());
}

#[tokio::test]
async fn bulk_send_targets_raw_addresses_without_directory_lookup() {
  let (n, mailer) = notifier().await;
  // Only a@x.com belongs to a registered account.
  n.store().add_user(student("a@x.com")).await.unwrap();

  n.send_notification(notification(Recipients::Bulk {
    emails: vec!["a@x.com".into(), "b@x.com".into()],
  }))
  .await
  .unwrap();

  let mut to = mailer.recipients();
  to.sort();
  assert_eq!(to, vec!["a@x.com", "b@x.com"]);
}

#[tokio::test]
async fn empty_descriptor_fails_validation_and_writes_nothing() {
  let (n, _) = notifier().await;

  let err = n
    .send_notification(notification(Recipients::Group { group_ids: vec![] }))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  assert!(n.all_notifications().await.unwrap().is_empty());
}

#[tokio::test]
async fn send_to_all_students_stores_an_individual_descriptor() {
  let (n, mailer) = notifier().await;
  let a = n.store().add_user(student("a@example.com")).await.unwrap();
  let b = n.store().add_user(student("b@example.com")).await.unwrap();

  let report = n
    .send_to_all_students("Welcome", "Term starts Monday.", Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(mailer.recipients().len(), 2);

  // The expansion is sugar over Individual, resolved at send time: a
  // student registered afterwards is not retroactively targeted.
  let stored = n
    .store()
    .get_notification(report.notification_id)
    .await
    .unwrap()
    .unwrap();
  match stored.recipients {
    Recipients::Individual { user_ids } => {
      assert_eq!(user_ids.len(), 2);
      assert!(user_ids.contains(&a.user_id) && user_ids.contains(&b.user_id));
    }
    other => panic!("expected individual descriptor, got {other:?}"),
  }

  let late = n.store().add_user(student("late@example.com")).await.unwrap();
  assert!(n.notifications_for_user(late.user_id).await.unwrap().is_empty());
}

// ─── Read path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_come_back_newest_first() {
  let (n, _) = notifier().await;
  let user = n.store().add_user(student("a@example.com")).await.unwrap();

  let mut ids = Vec::new();
  for i in 0..3 {
    let report = n
      .send_notification(NewNotification::new(
        format!("n{i}"),
        "x",
        Uuid::new_v4(),
        Recipients::Individual { user_ids: vec![user.user_id] },
      ))
      .await
      .unwrap();
    ids.push(report.notification_id);
  }

  let visible = n.notifications_for_user(user.user_id).await.unwrap();
  let got: Vec<_> = visible.iter().map(|n| n.notification_id).collect();
  ids.reverse();
  assert_eq!(got, ids);
}

#[tokio::test]
async fn unknown_user_reads_an_empty_list() {
  let (n, _) = notifier().await;
  n.send_notification(notification(Recipients::Bulk {
    emails: vec!["someone@x.com".into()],
  }))
  .await
  .unwrap();

  let visible = n.notifications_for_user(Uuid::new_v4()).await.unwrap();
  assert!(visible.is_empty());
}

#[tokio::test]
async fn bulk_notification_is_visible_to_the_matching_account() {
  let (n, _) = notifier().await;
  let holder = n.store().add_user(student("a@x.com")).await.unwrap();
  let other = n.store().add_user(student("c@x.com")).await.unwrap();

  n.send_notification(notification(Recipients::Bulk {
    emails: vec!["a@x.com".into(), "b@x.com".into()],
  }))
  .await
  .unwrap();

  assert_eq!(n.notifications_for_user(holder.user_id).await.unwrap().len(), 1);
  assert!(n.notifications_for_user(other.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn group_membership_is_evaluated_at_read_time() {
  let (n, _) = notifier().await;
  let group_id = Uuid::new_v4();
  // Someone has to be in the group for the send itself.
  n.store().add_user(student_in("member@example.com", vec![group_id])).await.unwrap();
  let joiner = n.store().add_user(student("joiner@example.com")).await.unwrap();

  n.send_notification(notification(Recipients::Group { group_ids: vec![group_id] }))
    .await
    .unwrap();

  // Not a member at send time: invisible.
  assert!(n.notifications_for_user(joiner.user_id).await.unwrap().is_empty());

  // Joining the group makes the historical notification visible...
  n.store().assign_to_group(joiner.user_id, group_id).await.unwrap();
  assert_eq!(n.notifications_for_user(joiner.user_id).await.unwrap().len(), 1);

  // ...and leaving hides it again. Deliberate: membership is never
  // snapshotted at send time.
  n.store().remove_from_group(joiner.user_id, group_id).await.unwrap();
  assert!(n.notifications_for_user(joiner.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_read_is_idempotent_through_the_resolver() {
  let (n, _) = notifier().await;
  let user = n.store().add_user(student("a@example.com")).await.unwrap();

  let report = n
    .send_notification(notification(Recipients::Individual {
      user_ids: vec![user.user_id],
    }))
    .await
    .unwrap();

  n.mark_read(report.notification_id, user.user_id).await.unwrap();
  n.mark_read(report.notification_id, user.user_id).await.unwrap();

  let stored = n
    .store()
    .get_notification(report.notification_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.read_by, vec![user.user_id]);
}

// ─── Announcements ───────────────────────────────────────────────────────────

#[tokio::test]
async fn announcement_emails_honour_the_announcement_preference() {
  let (n, mailer) = notifier().await;
  let admin = Uuid::new_v4();
  let group = n
    .store()
    .add_group(NewGroup {
      name:        "Linux Basics".into(),
      description: String::new(),
      created_by:  admin,
    })
    .await
    .unwrap();

  n.store()
    .add_user(student_in("keen@example.com", vec![group.group_id]))
    .await
    .unwrap();
  let quiet = n
    .store()
    .add_user(student_in("quiet@example.com", vec![group.group_id]))
    .await
    .unwrap();
  n.store()
    .set_preferences(quiet.user_id, NotificationPreferences {
      email_notifications: true,
      announcement_emails: false,
    })
    .await
    .unwrap();

  let report = n
    .post_announcement(NewAnnouncement::new(
      "Holiday",
      "No class Monday.",
      vec![group.group_id],
      admin,
    ))
    .await
    .unwrap();

  assert_eq!(mailer.recipients(), vec!["keen@example.com"]);

  // The announcement itself is visible to both students.
  let visible = n.announcements_for_user(quiet.user_id).await.unwrap();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].announcement_id, report.announcement_id);

  let sent = mailer.sent.lock().unwrap();
  assert!(sent[0].subject.contains("Holiday"));
  assert!(sent[0].html.contains("Linux Basics"));
}

#[tokio::test]
async fn announcements_are_scoped_to_the_users_groups() {
  let (n, _) = notifier().await;
  let admin = Uuid::new_v4();
  let (g1, g2) = (Uuid::new_v4(), Uuid::new_v4());

  let member = n.store().add_user(student_in("m@example.com", vec![g1])).await.unwrap();
  let outsider = n.store().add_user(student_in("o@example.com", vec![g2])).await.unwrap();

  n.post_announcement(NewAnnouncement::new("For g1", "x", vec![g1], admin))
    .await
    .unwrap();

  assert_eq!(n.announcements_for_user(member.user_id).await.unwrap().len(), 1);
  assert!(n.announcements_for_user(outsider.user_id).await.unwrap().is_empty());
  assert!(n.announcements_for_user(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn announcement_view_marking_flows_through_the_resolver() {
  let (n, _) = notifier().await;
  let admin = Uuid::new_v4();
  let group_id = Uuid::new_v4();
  let user = n.store().add_user(student_in("a@example.com", vec![group_id])).await.unwrap();

  let report = n
    .post_announcement(NewAnnouncement::new("Read me", "x", vec![group_id], admin))
    .await
    .unwrap();

  n.mark_announcement_viewed(report.announcement_id, user.user_id).await.unwrap();
  n.mark_announcement_viewed(report.announcement_id, user.user_id).await.unwrap();

  let stored = n
    .store()
    .get_announcement(report.announcement_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.view_count, 1);
}
