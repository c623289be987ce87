//! Error type for `classroom-notify`.
//!
//! Per-recipient delivery failures are deliberately absent: they are
//! caught inside the fan-out, logged, and reported in the
//! [`DeliveryReport`](crate::DeliveryReport), never raised as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error<E: std::error::Error> {
  /// Malformed recipient descriptor; nothing was written.
  #[error(transparent)]
  Validation(#[from] classroom_core::Error),

  /// The backing store failed; the operation aborted.
  #[error("store error: {0}")]
  Store(#[source] E),
}

pub type Result<T, E> = std::result::Result<T, Error<E>>;
