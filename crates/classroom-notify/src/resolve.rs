//! The read-side match predicate.
//!
//! Membership is evaluated against the user's *current* groups, mode and
//! email — nothing is snapshotted at send time. A user who joins a group
//! after a notification was sent sees it retroactively; one who leaves
//! stops seeing it. That is the documented behaviour, not an oversight.

use classroom_core::{notification::Recipients, user::User};

/// Does `recipients` target `user`?
pub fn matches(user: &User, recipients: &Recipients) -> bool {
  match recipients {
    Recipients::Individual { user_ids } => user_ids.contains(&user.user_id),
    Recipients::Group { group_ids } => group_ids
      .iter()
      .any(|g| user.assigned_groups.contains(g)),
    Recipients::Mode { mode } => user.mode == Some(*mode),
    Recipients::Bulk { emails } => emails.contains(&user.email),
  }
}
