//! Error classification logic for the retry loop

use crate::classifier::classify;
use crate::Error;

const RETRY_CONTEXT: &str = "retry decision";

/// Whether another attempt could succeed, per the classification table.
///
/// Only the client's own attempt loop acts on this; callers get the raw error.
pub(crate) fn is_retryable(err: &Error) -> bool {
    classify(err, Some(RETRY_CONTEXT)).is_retryable()
}
