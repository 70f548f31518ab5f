//! "Same value" semantics shared by every differ.
//!
//! All scalar comparisons in the engine go through [`is_same`], so null
//! handling is identical everywhere: an absent default value and an empty
//! string are different values unless the loader normalizes them first.

use crate::diff::NextPreviousDiff;

/// Null-safe exact equality.
///
/// Both absent is the same, exactly one absent is not, otherwise the values
/// are compared with `==`. No trimming and no case folding.
#[must_use]
pub fn is_same<T: PartialEq + ?Sized>(next: Option<&T>, previous: Option<&T>) -> bool {
    match (next, previous) {
        (None, None) => true,
        (Some(next), Some(previous)) => next == previous,
        _ => false,
    }
}

/// Returns a [`NextPreviousDiff`] when the values are not the same.
#[must_use]
pub fn diff_value<T: PartialEq + Clone>(
    next: Option<&T>,
    previous: Option<&T>,
) -> Option<NextPreviousDiff<T>> {
    if is_same(next, previous) {
        None
    } else {
        Some(NextPreviousDiff::new(next.cloned(), previous.cloned()))
    }
}

/// String flavour of [`diff_value`] taking borrowed slices.
#[must_use]
pub fn diff_text(next: Option<&str>, previous: Option<&str>) -> Option<NextPreviousDiff<String>> {
    if is_same(next, previous) {
        None
    } else {
        Some(NextPreviousDiff::new(
            next.map(str::to_string),
            previous.map(str::to_string),
        ))
    }
}
